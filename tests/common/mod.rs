//! Descriptors and helpers shared by the integration tests.

#![allow(dead_code)]

use chrono::{NaiveTime, Utc};
use ent_sdk::{
    Action, AlwaysAllowRule, AlwaysDenyRule, BoolField, DatetimeField, Descriptor, EdgeField, EnumField,
    Field, FieldValue, IntField, JsonField, MemorySession, Pattern, PrivacyRule, Registry, Schema,
    StringField, TextField, TimeField, UuidField, Vc, WithDefault, WithDynamicExample, WithExample,
};
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

ent_sdk::ent_enum! {
    pub enum Status in "crate::common::Status" { Happy, Sad }
}

ent_sdk::ent_enum! {
    pub enum ThingStatus in "crate::common::ThingStatus" { Good, Bad }
}

pub struct TestViewerContext {
    pub user: Option<Uuid>,
}

pub fn vc() -> Vc {
    Arc::new(TestViewerContext { user: None })
}

fn matches(pattern: &str, value: &FieldValue) -> bool {
    let re = Regex::new(pattern).expect("test pattern compiles");
    value.as_str().map_or(false, |s| s.is_empty() || re.is_match(s))
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

pub struct EntTestThingPattern;

impl Descriptor for EntTestThingPattern {
    fn name(&self) -> &'static str {
        "EntTestThingPattern"
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            StringField::new("a_good_thing", 100).not_null().example("A sunny day").into(),
            EnumField::<ThingStatus>::new("thing_status").into(),
            StringField::new("a_pattern_validated_field", 100)
                .example("vdurmont")
                .validator(|v: &FieldValue| {
                    v.as_str().map_or(false, |s| !s.is_empty()) && matches("^[a-z0-9-]+$", v)
                })
                .into(),
        ]
    }

    fn privacy_rules(&self, _action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        vec![Arc::new(AlwaysAllowRule)]
    }
}

impl Pattern for EntTestThingPattern {}

pub struct EntTestSubObjectSchema;

impl Descriptor for EntTestSubObjectSchema {
    fn name(&self) -> &'static str {
        "EntTestSubObjectSchema"
    }

    fn fields(&self) -> Vec<Field> {
        vec![StringField::new("email", 100).example("vdurmont@example.com").into()]
    }

    fn privacy_rules(&self, _action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        vec![Arc::new(AlwaysAllowRule)]
    }
}

impl Schema for EntTestSubObjectSchema {}

pub struct EntTestObjectSchema;

impl Descriptor for EntTestObjectSchema {
    fn name(&self) -> &'static str {
        "EntTestObjectSchema"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Object exercising every field kind.")
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            StringField::new("username", 100)
                .not_null()
                .unique()
                .documentation("Handle shown on the platform.")
                .dynamic_example(|| Uuid::new_v4().to_string())
                .into(),
            StringField::new("firstname", 100).index().not_null().example("Vincent").into(),
            StringField::new("lastname", 100).default("Doe").into(),
            StringField::new("city", 100).example("Los Angeles").into(),
            EdgeField::new("self", "EntTestObjectSchema").into(),
            EdgeField::new("some_pattern", "EntTestThingPattern").into(),
            EdgeField::new("required_sub_object", "EntTestSubObjectSchema").not_null().into(),
            EdgeField::new("optional_sub_object", "EntTestSubObjectSchema").into(),
            EdgeField::new("optional_sub_object_no_ex", "EntTestSubObjectSchema").no_example().into(),
            TextField::new("context").example("This is some good context.").immutable().into(),
            EnumField::<Status>::new("status").example(Status::Happy).into(),
            EnumField::<Status>::new("sadness").default(Status::Sad).into(),
            DatetimeField::new("when_is_it_cool").dynamic_example(Utc::now).into(),
            IntField::new("status_code").example(404).into(),
            JsonField::new("some_json")
                .type_hint("Vec<String>")
                .example(serde_json::json!(["hello", "world"]))
                .into(),
            StringField::new("validated_field", 100)
                .validator(|v: &FieldValue| matches("^[a-z0-9_-]+$", v))
                .into(),
            BoolField::new("is_it_true").example(false).into(),
            UuidField::new("correlation_id").example(Uuid::new_v4()).into(),
            UuidField::new("trace_id").dynamic_example(Uuid::new_v4).into(),
            TimeField::new("start_time").example(time(9, 30)).into(),
            TimeField::new("end_time").dynamic_example(|| time(17, 30)).into(),
        ]
    }

    fn privacy_rules(&self, _action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        vec![Arc::new(AlwaysAllowRule)]
    }
}

impl Schema for EntTestObjectSchema {
    fn patterns(&self) -> Vec<Arc<dyn Pattern>> {
        vec![Arc::new(EntTestThingPattern)]
    }
}

/// Second implementor of the thing pattern.
pub struct EntTestObject2Schema;

impl Descriptor for EntTestObject2Schema {
    fn name(&self) -> &'static str {
        "EntTestObject2Schema"
    }

    fn fields(&self) -> Vec<Field> {
        vec![StringField::new("obj2_field", 100).example("obj2").into()]
    }

    fn privacy_rules(&self, _action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        vec![Arc::new(AlwaysAllowRule)]
    }
}

impl Schema for EntTestObject2Schema {
    fn patterns(&self) -> Vec<Arc<dyn Pattern>> {
        vec![Arc::new(EntTestThingPattern)]
    }
}

pub struct EntTestObject5Schema;

impl Descriptor for EntTestObject5Schema {
    fn name(&self) -> &'static str {
        "EntTestObject5Schema"
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            StringField::new("obj5_field", 100).not_null().example("blah!").into(),
            BoolField::new("is_it_true").not_null().default(true).into(),
        ]
    }

    fn privacy_rules(&self, _action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        vec![Arc::new(AlwaysAllowRule)]
    }
}

impl Schema for EntTestObject5Schema {
    fn is_immutable(&self) -> bool {
        true
    }
}

/// Writable by anyone, readable by no one.
pub struct EntSecretSchema;

impl Descriptor for EntSecretSchema {
    fn name(&self) -> &'static str {
        "EntSecretSchema"
    }

    fn fields(&self) -> Vec<Field> {
        vec![StringField::new("secret", 100).not_null().example("hunter2").into()]
    }

    fn privacy_rules(&self, action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        match action {
            Action::Read => vec![Arc::new(AlwaysDenyRule)],
            _ => vec![Arc::new(AlwaysAllowRule)],
        }
    }
}

impl Schema for EntSecretSchema {}

pub fn registry() -> Registry {
    Registry::builder()
        .pattern(EntTestThingPattern)
        .schema(EntTestObjectSchema)
        .schema(EntTestObject2Schema)
        .schema(EntTestObject5Schema)
        .schema(EntTestSubObjectSchema)
        .schema(EntSecretSchema)
        .build()
        .expect("test registry resolves")
}

/// Fresh registry, empty in-memory store and an anonymous viewer.
pub fn setup() -> (Registry, MemorySession, Vc) {
    let registry = registry();
    let session = MemorySession::new(&registry);
    (registry, session, vc())
}
