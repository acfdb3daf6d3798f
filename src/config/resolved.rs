//! Resolved descriptor model: registered descriptors validated and flattened for
//! generation and runtime use.

use crate::case::to_snake_case;
use crate::descriptor::{CompositeIndex, Pattern, Schema};
use crate::field::{Field, FieldKind, FieldValue};
use crate::runtime::privacy::{Action, PrivacyRule};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";
/// Discriminator column of pattern views.
pub const ENT_TYPE_COLUMN: &str = "ent_type";

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: FieldKind,
    pub nullable: bool,
    pub unique: bool,
    pub indexed: bool,
    pub primary_key: bool,
    /// Server-side default rendered into DDL.
    pub default: Option<FieldValue>,
    /// Table referenced by a foreign key. Edges to patterns have none.
    pub references: Option<String>,
}

impl ColumnInfo {
    fn system(name: &str, kind: FieldKind, primary_key: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            nullable: false,
            unique: false,
            indexed: false,
            primary_key,
            default: None,
            references: None,
        }
    }

    pub(crate) fn id() -> Self {
        Self::system(ID_COLUMN, FieldKind::Uuid, true)
    }

    pub(crate) fn created_at() -> Self {
        Self::system(CREATED_AT_COLUMN, FieldKind::Datetime, false)
    }

    pub(crate) fn updated_at() -> Self {
        Self::system(UPDATED_AT_COLUMN, FieldKind::Datetime, false)
    }

    pub(crate) fn ent_type() -> Self {
        Self::system(ENT_TYPE_COLUMN, FieldKind::Text, false)
    }

    pub(crate) fn from_field(field: &Field, references: Option<String>) -> Self {
        Self {
            name: field.name.clone(),
            kind: field.kind.clone(),
            nullable: field.nullable,
            unique: field.unique,
            indexed: field.indexed,
            primary_key: false,
            default: field.default_value().cloned(),
            references,
        }
    }

    /// PostgreSQL type for DDL and parameter casts.
    pub fn pg_type(&self) -> String {
        pg_type(&self.kind)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, FieldKind::Enum(_))
    }
}

pub fn pg_type(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Bool => "boolean".into(),
        FieldKind::Int => "bigint".into(),
        FieldKind::String { length } => format!("varchar({})", length),
        FieldKind::Text => "text".into(),
        FieldKind::Datetime => "timestamptz".into(),
        FieldKind::Time => "time".into(),
        FieldKind::Uuid | FieldKind::Edge(_) => "uuid".into(),
        FieldKind::Enum(info) => to_snake_case(info.type_name),
        FieldKind::Json { .. } => "jsonb".into(),
    }
}

/// A physical table (schema) or view (pattern) with its column list in storage order.
#[derive(Clone, Debug)]
pub struct StorageTable {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl StorageTable {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// One branch of a pattern view's union.
#[derive(Clone, Debug)]
pub struct ViewMember {
    /// Literal placed in the `ent_type` column.
    pub discriminator: String,
    pub table: String,
}

pub struct ResolvedSchema {
    pub descriptor_name: String,
    pub base_name: String,
    pub module_name: String,
    pub description: Option<String>,
    pub type_tag: [u8; 2],
    /// Own and pattern fields, ordered.
    pub fields: Vec<Field>,
    /// Own fields only, ordered.
    pub own_fields: Vec<Field>,
    /// Base names of implemented patterns, in declaration order.
    pub patterns: Vec<String>,
    pub composite_indexes: Vec<CompositeIndex>,
    pub immutable: bool,
    pub table: StorageTable,
    pub(crate) descriptor: Arc<dyn Schema>,
    pub(crate) pattern_descriptors: Vec<Arc<dyn Pattern>>,
}

impl ResolvedSchema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn implements(&self, pattern_base: &str) -> bool {
        self.patterns.iter().any(|p| p == pattern_base)
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.unique)
    }

    pub fn mutable_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.immutable)
    }

    /// Schema rules, then each pattern's rules in declaration order.
    pub fn privacy_rules(&self, action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        let mut rules = self.descriptor.privacy_rules(action);
        for pattern in &self.pattern_descriptors {
            rules.extend(pattern.privacy_rules(action));
        }
        rules
    }
}

impl fmt::Debug for ResolvedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSchema")
            .field("descriptor_name", &self.descriptor_name)
            .field("type_tag", &self.type_tag)
            .field("patterns", &self.patterns)
            .field("table", &self.table.name)
            .finish_non_exhaustive()
    }
}

pub struct ResolvedPattern {
    pub descriptor_name: String,
    pub base_name: String,
    pub module_name: String,
    pub description: Option<String>,
    /// Pattern fields, ordered.
    pub fields: Vec<Field>,
    /// Base names of implementing schemas, by descriptor name.
    pub implementors: Vec<String>,
    /// `ent_type`, id, timestamps, then the pattern columns.
    pub view: StorageTable,
    pub members: Vec<ViewMember>,
    /// Base name of the schema examples instantiate for edges to this pattern.
    pub example_schema: Option<String>,
    pub(crate) descriptor: Arc<dyn Pattern>,
}

impl ResolvedPattern {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn privacy_rules(&self, action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        self.descriptor.privacy_rules(action)
    }
}

impl fmt::Debug for ResolvedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedPattern")
            .field("descriptor_name", &self.descriptor_name)
            .field("implementors", &self.implementors)
            .field("view", &self.view.name)
            .finish_non_exhaustive()
    }
}

/// Immutable set of resolved descriptors, cheap to clone.
#[derive(Clone, Debug)]
pub struct Registry {
    pub(crate) inner: Arc<RegistryInner>,
}

#[derive(Debug)]
pub(crate) struct RegistryInner {
    pub schemas: Vec<Arc<ResolvedSchema>>,
    pub patterns: Vec<Arc<ResolvedPattern>>,
    pub schema_by_name: HashMap<String, usize>,
    pub pattern_by_name: HashMap<String, usize>,
    pub schema_by_tag: HashMap<[u8; 2], usize>,
}

impl Registry {
    /// Schemas ordered by descriptor name.
    pub fn schemas(&self) -> &[Arc<ResolvedSchema>] {
        &self.inner.schemas
    }

    /// Patterns ordered by descriptor name.
    pub fn patterns(&self) -> &[Arc<ResolvedPattern>] {
        &self.inner.patterns
    }

    /// Look up by base name (`EntUser`) or descriptor name (`EntUserSchema`).
    pub fn resolved_schema(&self, name: &str) -> Option<&Arc<ResolvedSchema>> {
        lookup(&self.inner.schema_by_name, name, "Schema").map(|i| &self.inner.schemas[i])
    }

    pub fn resolved_pattern(&self, name: &str) -> Option<&Arc<ResolvedPattern>> {
        lookup(&self.inner.pattern_by_name, name, "Pattern").map(|i| &self.inner.patterns[i])
    }

    pub fn schema_for_tag(&self, tag: [u8; 2]) -> Option<&Arc<ResolvedSchema>> {
        self.inner.schema_by_tag.get(&tag).map(|&i| &self.inner.schemas[i])
    }

    /// Target of an edge, by descriptor name.
    pub fn edge_target(&self, descriptor_name: &str) -> Option<EdgeTarget<'_>> {
        if descriptor_name.ends_with("Pattern") {
            self.resolved_pattern(descriptor_name).map(EdgeTarget::Pattern)
        } else {
            self.resolved_schema(descriptor_name).map(EdgeTarget::Schema)
        }
    }
}

/// Exact base name first; a descriptor name falls back to its stripped suffix.
fn lookup(by_base: &HashMap<String, usize>, name: &str, suffix: &str) -> Option<usize> {
    by_base
        .get(name)
        .or_else(|| name.strip_suffix(suffix).and_then(|base| by_base.get(base)))
        .copied()
}

#[derive(Clone, Copy, Debug)]
pub enum EdgeTarget<'a> {
    Schema(&'a Arc<ResolvedSchema>),
    Pattern(&'a Arc<ResolvedPattern>),
}
