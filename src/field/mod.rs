//! Field model: typed field declarations carried by descriptors.

mod builders;
mod enumeration;
mod validator;
mod value;

pub use builders::{
    BoolField, DatetimeField, EdgeField, EnumField, IntField, JsonField, StringField, TextField,
    TimeField, TypedField, UuidField, WithDefault, WithDynamicExample, WithExample,
};
pub use enumeration::EntEnum;
pub use validator::{FieldValidator, Format, LengthValidator, OneOf, PatternValidator, RangeValidator};
pub use value::{FieldValue, FromFieldValue};

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub type DynamicExample = Arc<dyn Fn() -> FieldValue + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumInfo {
    pub type_name: &'static str,
    pub type_path: &'static str,
    pub variants: &'static [&'static str],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeInfo {
    /// Descriptor name of the target schema or pattern.
    pub target: String,
    pub generate_example: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    String { length: u32 },
    Text,
    Datetime,
    Time,
    Uuid,
    Enum(EnumInfo),
    Json { type_hint: Option<String> },
    Edge(EdgeInfo),
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::String { .. } => "string",
            FieldKind::Text => "text",
            FieldKind::Datetime => "datetime",
            FieldKind::Time => "time",
            FieldKind::Uuid => "uuid",
            FieldKind::Enum(_) => "enum",
            FieldKind::Json { .. } => "json",
            FieldKind::Edge(_) => "edge",
        }
    }

    /// Coerce an incoming value to this kind. Strings are accepted for uuid/edge columns and
    /// enum variants; string length limits are enforced here.
    pub fn coerce(&self, value: FieldValue) -> Result<FieldValue, String> {
        if value.is_null() {
            return Ok(value);
        }
        match (self, value) {
            (FieldKind::Bool, v @ FieldValue::Bool(_)) => Ok(v),
            (FieldKind::Int, v @ FieldValue::Int(_)) => Ok(v),
            (FieldKind::String { length }, FieldValue::String(s)) => {
                if s.chars().count() > *length as usize {
                    Err(format!("exceeds maximum length {}", length))
                } else {
                    Ok(FieldValue::String(s))
                }
            }
            (FieldKind::Text, v @ FieldValue::String(_)) => Ok(v),
            (FieldKind::Datetime, v @ FieldValue::Datetime(_)) => Ok(v),
            (FieldKind::Time, v @ FieldValue::Time(_)) => Ok(v),
            (FieldKind::Uuid | FieldKind::Edge(_), v @ FieldValue::Uuid(_)) => Ok(v),
            (FieldKind::Uuid | FieldKind::Edge(_), FieldValue::String(s)) => Uuid::parse_str(&s)
                .map(FieldValue::Uuid)
                .map_err(|_| format!("'{}' is not a UUID", s)),
            (FieldKind::Enum(info), FieldValue::Enum(s) | FieldValue::String(s)) => {
                if info.variants.contains(&s.as_str()) {
                    Ok(FieldValue::Enum(s))
                } else {
                    Err(format!("'{}' is not a variant of {}", s, info.type_name))
                }
            }
            (FieldKind::Json { .. }, v) => Ok(FieldValue::Json(v.to_json())),
            (kind, v) => Err(format!("expected {}, got {}", kind.label(), v.type_label())),
        }
    }
}

/// A declared field. Built through the typed builders (`StringField::new(..)` etc.) and
/// converted with `.into()` inside a descriptor's `fields()`.
#[derive(Clone)]
pub struct Field {
    /// Column name. Edges store `<original_name>_id`.
    pub name: String,
    pub original_name: String,
    pub kind: FieldKind,
    pub nullable: bool,
    pub unique: bool,
    pub indexed: bool,
    pub immutable: bool,
    pub description: Option<String>,
    pub(crate) validators: Vec<Arc<dyn FieldValidator>>,
    pub(crate) example: Option<FieldValue>,
    pub(crate) dynamic_example: Option<DynamicExample>,
    pub(crate) default: Option<FieldValue>,
}

impl Field {
    pub(crate) fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            original_name: name.to_string(),
            kind,
            nullable: true,
            unique: false,
            indexed: false,
            immutable: false,
            description: None,
            validators: Vec::new(),
            example: None,
            dynamic_example: None,
            default: None,
        }
    }

    pub fn validators(&self) -> &[Arc<dyn FieldValidator>] {
        &self.validators
    }

    pub fn example(&self) -> Option<&FieldValue> {
        self.example.as_ref()
    }

    pub fn dynamic_example(&self) -> Option<&DynamicExample> {
        self.dynamic_example.as_ref()
    }

    pub fn default_value(&self) -> Option<&FieldValue> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn edge(&self) -> Option<&EdgeInfo> {
        match &self.kind {
            FieldKind::Edge(info) => Some(info),
            _ => None,
        }
    }

    pub fn is_mandatory(&self) -> bool {
        !self.nullable && self.default.is_none()
    }

    /// Whether the example factory can fill this field without help from the caller.
    pub fn has_example_source(&self) -> bool {
        self.example.is_some()
            || self.dynamic_example.is_some()
            || self.edge().map_or(false, |e| e.generate_example)
    }

    /// Static example first, then a fresh dynamic one.
    pub fn next_example(&self) -> Option<FieldValue> {
        self.example
            .clone()
            .or_else(|| self.dynamic_example.as_ref().map(|generate| generate()))
    }

    pub fn validate(&self, value: &FieldValue) -> bool {
        self.validators.iter().all(|v| v.validate(value))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("unique", &self.unique)
            .field("indexed", &self.indexed)
            .field("immutable", &self.immutable)
            .field("validators", &self.validators.len())
            .field("example", &self.example)
            .field("dynamic_example", &self.dynamic_example.is_some())
            .field("default", &self.default)
            .finish()
    }
}
