mod common;

use common::*;
use ent_sdk::{
    type_tag, CompositeIndex, ConfigError, Descriptor, EdgeField, Field, Pattern, Registry, Schema,
    StringField,
};
use std::sync::Arc;

struct EntDanglingSchema;

impl Descriptor for EntDanglingSchema {
    fn name(&self) -> &'static str {
        "EntDanglingSchema"
    }

    fn fields(&self) -> Vec<Field> {
        vec![EdgeField::new("target", "EntMissingSchema").into()]
    }
}

impl Schema for EntDanglingSchema {}

struct BadlyNamed;

impl Descriptor for BadlyNamed {
    fn name(&self) -> &'static str {
        "TestObjectSchema"
    }

    fn fields(&self) -> Vec<Field> {
        Vec::new()
    }
}

impl Schema for BadlyNamed {}

/// Redeclares a field of the pattern it implements.
struct EntClashSchema;

impl Descriptor for EntClashSchema {
    fn name(&self) -> &'static str {
        "EntClashSchema"
    }

    fn fields(&self) -> Vec<Field> {
        vec![StringField::new("a_good_thing", 10).into()]
    }
}

impl Schema for EntClashSchema {
    fn patterns(&self) -> Vec<Arc<dyn Pattern>> {
        vec![Arc::new(EntTestThingPattern)]
    }
}

/// Field-less descriptor whose name is chosen per test.
struct Named(&'static str);

impl Descriptor for Named {
    fn name(&self) -> &'static str {
        self.0
    }

    fn fields(&self) -> Vec<Field> {
        Vec::new()
    }
}

impl Schema for Named {}
impl Pattern for Named {}

struct EntIndexedSchema;

impl Descriptor for EntIndexedSchema {
    fn name(&self) -> &'static str {
        "EntIndexedSchema"
    }

    fn fields(&self) -> Vec<Field> {
        vec![StringField::new("slug", 10).into()]
    }
}

impl Schema for EntIndexedSchema {
    fn composite_indexes(&self) -> Vec<CompositeIndex> {
        vec![CompositeIndex::new("ix_slug_title", &["slug", "title"])]
    }
}

#[test]
fn tags_are_derived_from_base_names() {
    let registry = registry();
    let tag = |name: &str| registry.resolved_schema(name).map(|s| s.type_tag);
    assert_eq!(tag("EntTestObject"), Some([0x23, 0x1c]));
    assert_eq!(tag("EntTestObject2Schema"), Some([0x7c, 0x9a]));
    assert_eq!(tag("EntTestObject5"), Some([0xf1, 0x91]));
    assert_eq!(tag("EntTestSubObject"), Some([0x16, 0xd7]));
    assert_eq!(
        registry.schema_for_tag(type_tag("EntTestObject")).map(|s| s.base_name.as_str()),
        Some("EntTestObject")
    );
    assert!(registry.schema_for_tag([0, 0]).is_none());
}

#[test]
fn names_and_tables() {
    let registry = registry();
    let object = registry.resolved_schema("EntTestObjectSchema").expect("registered");
    assert_eq!(object.base_name, "EntTestObject");
    assert_eq!(object.module_name, "ent_test_object");
    assert_eq!(object.table.name, "test_object");
    let columns: Vec<_> = object.table.column_names().take(4).collect();
    assert_eq!(columns, ["id", "created_at", "updated_at", "a_good_thing"]);
    assert_eq!(
        object.table.column("required_sub_object_id").and_then(|c| c.references.clone()),
        Some("test_sub_object".to_string())
    );
    assert_eq!(object.table.column("some_pattern_id").and_then(|c| c.references.clone()), None);
}

#[test]
fn pattern_view_lists_implementors() {
    let registry = registry();
    let thing = registry.resolved_pattern("EntTestThing").expect("registered");
    assert_eq!(thing.view.name, "ent_test_thing_view");
    assert_eq!(thing.implementors, ["EntTestObject2", "EntTestObject"]);
    assert_eq!(thing.example_schema.as_deref(), Some("EntTestObject2"));
    let columns: Vec<_> = thing.view.column_names().collect();
    assert_eq!(
        columns,
        [
            "ent_type",
            "id",
            "created_at",
            "updated_at",
            "a_good_thing",
            "a_pattern_validated_field",
            "thing_status",
        ]
    );
}

#[test]
fn dangling_edge_is_rejected() {
    let err = Registry::builder().schema(EntDanglingSchema).build().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingReference { kind: "edge target", ref id } if id == "EntMissingSchema"
    ));
}

#[test]
fn unregistered_pattern_is_rejected() {
    let err = Registry::builder()
        .schema(EntTestSubObjectSchema)
        .schema(EntTestObject2Schema)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingReference { kind: "pattern", .. }));
}

#[test]
fn descriptor_names_need_prefix_and_suffix() {
    let err = Registry::builder().schema(BadlyNamed).build().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidDescriptorName { suffix: "Schema", .. }));
}

#[test]
fn duplicate_registration_is_rejected() {
    let err = Registry::builder()
        .schema(EntTestSubObjectSchema)
        .schema(EntTestSubObjectSchema)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateDescriptor(ref name) if name == "EntTestSubObjectSchema"));
}

#[test]
fn field_shadowing_a_pattern_field_is_rejected() {
    let err = Registry::builder()
        .pattern(EntTestThingPattern)
        .schema(EntClashSchema)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateField { ref field, .. } if field == "a_good_thing"));
}

#[test]
fn composite_index_must_name_known_fields() {
    let err = Registry::builder().schema(EntIndexedSchema).build().unwrap_err();
    assert!(matches!(err, ConfigError::UnknownIndexField { ref field, .. } if field == "title"));
}

#[test]
fn schemas_are_ordered_by_descriptor_name() {
    let registry = registry();
    let names: Vec<_> = registry.schemas().iter().map(|s| s.descriptor_name.as_str()).collect();
    assert_eq!(
        names,
        [
            "EntSecretSchema",
            "EntTestObject2Schema",
            "EntTestObject5Schema",
            "EntTestObjectSchema",
            "EntTestSubObjectSchema",
        ]
    );
}

#[test]
fn base_names_ending_in_schema_resolve() {
    let registry = Registry::builder().schema(Named("EntXmlSchemaSchema")).build().unwrap();
    let by_base = registry.schema("EntXmlSchema").unwrap();
    assert_eq!(by_base.resolved().descriptor_name, "EntXmlSchemaSchema");
    assert_eq!(by_base.table().name, "xml_schema");
    assert!(registry.schema("EntXmlSchemaSchema").is_ok());
    assert!(registry.schema("EntXml").is_err());

    let registry = Registry::builder().pattern(Named("EntShapePatternPattern")).build().unwrap();
    assert_eq!(registry.pattern("EntShapePattern").unwrap().resolved().base_name, "EntShapePattern");
}

#[test]
fn ambiguous_lookup_names_are_rejected() {
    let err = Registry::builder()
        .schema(Named("EntXmlSchema"))
        .schema(Named("EntXmlSchemaSchema"))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::NameCollision { kind: "schema name", ref name, .. } if name == "EntXmlSchema"
    ));
}

#[test]
fn schema_and_pattern_cannot_share_a_module() {
    let err = Registry::builder()
        .schema(Named("EntFooSchema"))
        .pattern(Named("EntFooPattern"))
        .build()
        .unwrap_err();
    match err {
        ConfigError::NameCollision { kind, name, first, second } => {
            assert_eq!(kind, "generated module");
            assert_eq!(name, "ent_foo");
            assert_eq!(first, "EntFooSchema");
            assert_eq!(second, "EntFooPattern");
        }
        other => panic!("expected a name collision, got {:?}", other),
    }
}

#[test]
fn schema_cannot_shadow_a_view_unit_or_relation() {
    let err = Registry::builder()
        .schema(Named("EntFooViewSchema"))
        .pattern(Named("EntFooPattern"))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::NameCollision { kind: "generated module", ref name, .. } if name == "ent_foo_view"
    ));

    let err = Registry::builder()
        .schema(Named("EntEntFooViewSchema"))
        .pattern(Named("EntFooPattern"))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::NameCollision { kind: "view", ref name, .. } if name == "ent_foo_view"
    ));
}

#[test]
fn schema_cannot_shadow_a_shared_unit() {
    let err = Registry::builder().schema(Named("EntModelSchema")).build().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::NameCollision { kind: "generated module", ref first, .. } if first == "ent-sdk"
    ));
}
