//! Descriptors of the example application: users, and posts owned by them.

use crate::vc::ViewerContext;
use async_trait::async_trait;
use ent_sdk::{
    Action, AlwaysAllowRule, CompositeIndex, Decision, Descriptor, EdgeField, Ent, EnumField, Field,
    FieldValue, Format, LengthValidator, Pattern, PrivacyRule, Schema, StringField, TextField,
    ViewerContext as Viewer, WithDefault, WithDynamicExample, WithExample,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

ent_sdk::ent_enum! {
    pub enum PostStatus in "crate::schemas::PostStatus" { Draft, Published }
}

static NEXT_EMAIL: AtomicU64 = AtomicU64::new(1);

/// Published rows are public; drafts are only visible to their owner.
pub struct PublishedOrOwner;

#[async_trait]
impl PrivacyRule for PublishedOrOwner {
    async fn evaluate(&self, vc: &dyn Viewer, ent: &Ent) -> Decision {
        if ent.get("status") == &FieldValue::from(PostStatus::Published) {
            return Decision::Allow;
        }
        let viewer = vc.as_any().downcast_ref::<ViewerContext>().and_then(|v| v.user_id);
        match (viewer, ent.get("owner_id").as_uuid()) {
            (Some(viewer), Some(owner)) if viewer == owner => Decision::Allow,
            _ => Decision::Pass,
        }
    }
}

pub struct EntOwnedPattern;

impl Descriptor for EntOwnedPattern {
    fn name(&self) -> &'static str {
        "EntOwnedPattern"
    }

    fn fields(&self) -> Vec<Field> {
        vec![EdgeField::new("owner", "EntUserSchema").not_null().index().into()]
    }
}

impl Pattern for EntOwnedPattern {}

pub struct EntUserSchema;

impl Descriptor for EntUserSchema {
    fn name(&self) -> &'static str {
        "EntUserSchema"
    }

    fn description(&self) -> Option<&'static str> {
        Some("A registered account.")
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            StringField::new("email", 255)
                .not_null()
                .unique()
                .validator(Format::Email)
                .dynamic_example(|| format!("user{}@example.com", NEXT_EMAIL.fetch_add(1, Ordering::Relaxed)))
                .into(),
            StringField::new("display_name", 100)
                .not_null()
                .validator(LengthValidator::at_least(1))
                .example("Ada")
                .into(),
            TextField::new("bio").into(),
        ]
    }

    fn privacy_rules(&self, _action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        vec![Arc::new(AlwaysAllowRule)]
    }
}

impl Schema for EntUserSchema {}

pub struct EntPostSchema;

impl Descriptor for EntPostSchema {
    fn name(&self) -> &'static str {
        "EntPostSchema"
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            StringField::new("title", 200).not_null().example("Hello").into(),
            EnumField::<PostStatus>::new("status").not_null().default(PostStatus::Draft).into(),
            TextField::new("body").into(),
        ]
    }

    fn privacy_rules(&self, action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        match action {
            Action::Read => vec![Arc::new(PublishedOrOwner)],
            _ => vec![Arc::new(AlwaysAllowRule)],
        }
    }
}

impl Schema for EntPostSchema {
    fn patterns(&self) -> Vec<Arc<dyn Pattern>> {
        vec![Arc::new(EntOwnedPattern)]
    }

    fn composite_indexes(&self) -> Vec<CompositeIndex> {
        vec![CompositeIndex::new("ix_post_owner_created", &["owner_id", "created_at"])]
    }
}
