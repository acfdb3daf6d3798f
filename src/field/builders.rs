//! Typed field builders.
//!
//! Capabilities are traits so unsupported combinations do not compile: a
//! `DatetimeField` has `example`/`dynamic_example` but no `default`, and an
//! `EdgeField` has neither (only `no_example`).

use crate::field::{EdgeInfo, EntEnum, EnumInfo, Field, FieldKind, FieldValidator, FieldValue};
use chrono::{DateTime, NaiveTime, Utc};
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Builder with a typed value, convertible into a [`Field`].
pub trait TypedField: Sized {
    type Value;

    fn encode(value: Self::Value) -> FieldValue;
    fn field_mut(&mut self) -> &mut Field;
}

pub trait WithExample: TypedField {
    fn example(mut self, value: impl Into<Self::Value>) -> Self {
        self.field_mut().example = Some(Self::encode(value.into()));
        self
    }
}

pub trait WithDynamicExample: TypedField {
    fn dynamic_example<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> Self::Value + Send + Sync + 'static,
        Self: 'static,
    {
        self.field_mut().dynamic_example = Some(Arc::new(move || Self::encode(generator())));
        self
    }
}

pub trait WithDefault: TypedField {
    fn default(mut self, value: impl Into<Self::Value>) -> Self {
        self.field_mut().default = Some(Self::encode(value.into()));
        self
    }
}

macro_rules! field_builder {
    ($builder:ident $(<$g:ident: $bound:ident>)?, $value:ty, |$v:ident| $encode:expr) => {
        impl$(<$g: $bound>)? TypedField for $builder$(<$g>)? {
            type Value = $value;

            fn encode($v: Self::Value) -> FieldValue {
                $encode
            }

            fn field_mut(&mut self) -> &mut Field {
                &mut self.field
            }
        }

        impl$(<$g: $bound>)? $builder$(<$g>)? {
            pub fn not_null(mut self) -> Self {
                self.field.nullable = false;
                self
            }

            pub fn unique(mut self) -> Self {
                self.field.unique = true;
                self
            }

            pub fn index(mut self) -> Self {
                self.field.indexed = true;
                self
            }

            pub fn immutable(mut self) -> Self {
                self.field.immutable = true;
                self
            }

            pub fn documentation(mut self, doc: impl Into<String>) -> Self {
                self.field.description = Some(doc.into());
                self
            }

            pub fn validator(mut self, validator: impl FieldValidator + 'static) -> Self {
                self.field.validators.push(Arc::new(validator));
                self
            }
        }

        impl$(<$g: $bound>)? From<$builder$(<$g>)?> for Field {
            fn from(builder: $builder$(<$g>)?) -> Field {
                builder.field
            }
        }
    };
}

pub struct BoolField {
    field: Field,
}

impl BoolField {
    pub fn new(name: &str) -> Self {
        Self { field: Field::new(name, FieldKind::Bool) }
    }
}

field_builder!(BoolField, bool, |v| FieldValue::Bool(v));
impl WithExample for BoolField {}
impl WithDynamicExample for BoolField {}
impl WithDefault for BoolField {}

/// 64-bit integer column.
pub struct IntField {
    field: Field,
}

impl IntField {
    pub fn new(name: &str) -> Self {
        Self { field: Field::new(name, FieldKind::Int) }
    }
}

field_builder!(IntField, i64, |v| FieldValue::Int(v));
impl WithExample for IntField {}
impl WithDynamicExample for IntField {}
impl WithDefault for IntField {}

/// Bounded string (`VARCHAR(length)`).
pub struct StringField {
    field: Field,
}

impl StringField {
    pub fn new(name: &str, length: u32) -> Self {
        Self { field: Field::new(name, FieldKind::String { length }) }
    }
}

field_builder!(StringField, String, |v| FieldValue::String(v));
impl WithExample for StringField {}
impl WithDynamicExample for StringField {}
impl WithDefault for StringField {}

pub struct TextField {
    field: Field,
}

impl TextField {
    pub fn new(name: &str) -> Self {
        Self { field: Field::new(name, FieldKind::Text) }
    }
}

field_builder!(TextField, String, |v| FieldValue::String(v));
impl WithExample for TextField {}
impl WithDynamicExample for TextField {}
impl WithDefault for TextField {}

pub struct DatetimeField {
    field: Field,
}

impl DatetimeField {
    pub fn new(name: &str) -> Self {
        Self { field: Field::new(name, FieldKind::Datetime) }
    }
}

field_builder!(DatetimeField, DateTime<Utc>, |v| FieldValue::Datetime(v));
impl WithExample for DatetimeField {}
impl WithDynamicExample for DatetimeField {}

pub struct TimeField {
    field: Field,
}

impl TimeField {
    pub fn new(name: &str) -> Self {
        Self { field: Field::new(name, FieldKind::Time) }
    }
}

field_builder!(TimeField, NaiveTime, |v| FieldValue::Time(v));
impl WithExample for TimeField {}
impl WithDynamicExample for TimeField {}

pub struct UuidField {
    field: Field,
}

impl UuidField {
    pub fn new(name: &str) -> Self {
        Self { field: Field::new(name, FieldKind::Uuid) }
    }
}

field_builder!(UuidField, Uuid, |v| FieldValue::Uuid(v));
impl WithExample for UuidField {}
impl WithDynamicExample for UuidField {}

/// Column holding one variant of `E`.
pub struct EnumField<E: EntEnum> {
    field: Field,
    _marker: PhantomData<fn() -> E>,
}

impl<E: EntEnum> EnumField<E> {
    pub fn new(name: &str) -> Self {
        let info = EnumInfo {
            type_name: E::TYPE_NAME,
            type_path: E::TYPE_PATH,
            variants: E::VARIANTS,
        };
        Self { field: Field::new(name, FieldKind::Enum(info)), _marker: PhantomData }
    }
}

field_builder!(EnumField<E: EntEnum>, E, |v| FieldValue::from_enum(v));
impl<E: EntEnum> WithExample for EnumField<E> {}
impl<E: EntEnum> WithDynamicExample for EnumField<E> {}
impl<E: EntEnum> WithDefault for EnumField<E> {}

/// JSON document (`JSONB`). `type_hint` is the Rust type generated accessors deserialize into.
pub struct JsonField {
    field: Field,
}

impl JsonField {
    pub fn new(name: &str) -> Self {
        Self { field: Field::new(name, FieldKind::Json { type_hint: None }) }
    }

    pub fn type_hint(mut self, hint: impl Into<String>) -> Self {
        self.field.kind = FieldKind::Json { type_hint: Some(hint.into()) };
        self
    }
}

field_builder!(JsonField, serde_json::Value, |v| FieldValue::Json(v));
impl WithExample for JsonField {}
impl WithDynamicExample for JsonField {}
impl WithDefault for JsonField {}

/// Reference to another schema or pattern, stored as `<name>_id`.
pub struct EdgeField {
    field: Field,
}

impl EdgeField {
    pub fn new(name: &str, target: &str) -> Self {
        let mut field = Field::new(
            &format!("{}_id", name),
            FieldKind::Edge(EdgeInfo { target: target.to_string(), generate_example: true }),
        );
        field.original_name = name.to_string();
        Self { field }
    }

    /// Do not synthesize a target entity when building examples.
    pub fn no_example(mut self) -> Self {
        if let FieldKind::Edge(info) = &mut self.field.kind {
            info.generate_example = false;
        }
        self
    }
}

field_builder!(EdgeField, Uuid, |v| FieldValue::Uuid(v));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_field_stores_id_column() {
        let f: Field = EdgeField::new("parent", "EntParentSchema").not_null().into();
        assert_eq!(f.name, "parent_id");
        assert_eq!(f.original_name, "parent");
        assert!(!f.nullable);
        assert!(f.edge().map_or(false, |e| e.generate_example));

        let f: Field = EdgeField::new("parent", "EntParentSchema").no_example().into();
        assert!(!f.has_example_source());
    }

    #[test]
    fn dynamic_example_is_called_each_time() {
        use std::sync::atomic::{AtomicI64, Ordering};
        let counter = Arc::new(AtomicI64::new(0));
        let c = counter.clone();
        let f: Field = IntField::new("n")
            .dynamic_example(move || c.fetch_add(1, Ordering::SeqCst))
            .into();
        assert_eq!(f.next_example(), Some(FieldValue::Int(0)));
        assert_eq!(f.next_example(), Some(FieldValue::Int(1)));
    }

    #[test]
    fn static_example_wins_over_dynamic() {
        let f: Field = StringField::new("s", 10)
            .example("fixed")
            .dynamic_example(|| "dyn".to_string())
            .default("d")
            .into();
        assert_eq!(f.next_example(), Some(FieldValue::from("fixed")));
        assert_eq!(f.default_value(), Some(&FieldValue::from("d")));
        assert!(!f.is_mandatory());
    }
}
