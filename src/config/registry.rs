//! Explicit descriptor registration and resolution into a [`Registry`].

use crate::case::{base_name, module_name, table_name, view_name};
use crate::config::resolved::{
    ColumnInfo, Registry, RegistryInner, ResolvedPattern, ResolvedSchema, StorageTable, ViewMember,
};
use crate::config::validate;
use crate::descriptor::{sort_fields, Pattern, Schema};
use crate::error::ConfigError;
use crate::field::Field;
use crate::runtime::id::type_tag;
use std::collections::HashMap;
use std::sync::Arc;

/// Collects descriptors; `build` validates and resolves them.
///
/// ```ignore
/// let registry = Registry::builder()
///     .pattern(EntTestThingPattern)
///     .schema(EntTestObjectSchema)
///     .build()?;
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    schemas: Vec<Arc<dyn Schema>>,
    patterns: Vec<Arc<dyn Pattern>>,
}

impl RegistryBuilder {
    pub fn schema(mut self, schema: impl Schema) -> Self {
        self.schemas.push(Arc::new(schema));
        self
    }

    pub fn pattern(mut self, pattern: impl Pattern) -> Self {
        self.patterns.push(Arc::new(pattern));
        self
    }

    pub fn build(self) -> Result<Registry, ConfigError> {
        resolve(self.schemas, self.patterns)
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }
}

fn resolve(
    mut schemas: Vec<Arc<dyn Schema>>,
    mut patterns: Vec<Arc<dyn Pattern>>,
) -> Result<Registry, ConfigError> {
    validate(&schemas, &patterns)?;
    schemas.sort_by_key(|s| s.name());
    patterns.sort_by_key(|p| p.name());

    let base_of = |name: &'static str, suffix: &'static str| {
        base_name(name, suffix)
            .map(str::to_string)
            .ok_or(ConfigError::InvalidDescriptorName { name: name.to_string(), suffix })
    };
    // Descriptor name -> table name, for foreign keys.
    let mut tables: HashMap<&str, String> = HashMap::new();
    for s in &schemas {
        tables.insert(s.name(), table_name(&base_of(s.name(), "Schema")?));
    }

    let mut resolved_schemas = Vec::with_capacity(schemas.len());
    let mut schema_by_name = HashMap::new();
    let mut schema_by_tag: HashMap<[u8; 2], usize> = HashMap::new();
    for (i, s) in schemas.iter().enumerate() {
        let base = base_of(s.name(), "Schema")?;
        let tag = type_tag(&base);
        if let Some(&other) = schema_by_tag.get(&tag) {
            return Err(ConfigError::TypeTagCollision {
                tag,
                first: schemas[other].name().to_string(),
                second: s.name().to_string(),
            });
        }
        schema_by_tag.insert(tag, i);

        let pattern_descriptors = s.patterns();
        let pattern_bases = pattern_descriptors
            .iter()
            .map(|p| base_of(p.name(), "Pattern"))
            .collect::<Result<Vec<_>, _>>()?;
        let fields = s.all_fields();
        let table = StorageTable {
            name: table_name(&base),
            columns: storage_columns(&fields, &tables),
        };
        schema_by_name.insert(base.clone(), i);
        resolved_schemas.push(Arc::new(ResolvedSchema {
            descriptor_name: s.name().to_string(),
            module_name: module_name(&base),
            description: s.description().map(str::to_string),
            type_tag: tag,
            own_fields: s.sorted_fields(),
            fields,
            patterns: pattern_bases,
            composite_indexes: s.composite_indexes(),
            immutable: s.is_immutable(),
            table,
            descriptor: s.clone(),
            pattern_descriptors,
            base_name: base,
        }));
    }

    let mut resolved_patterns = Vec::with_capacity(patterns.len());
    let mut pattern_by_name = HashMap::new();
    for (i, p) in patterns.iter().enumerate() {
        let base = base_of(p.name(), "Pattern")?;
        let implementors: Vec<&Arc<ResolvedSchema>> =
            resolved_schemas.iter().filter(|s| s.implements(&base)).collect();
        let fields = sort_fields(p.fields());
        let mut columns = vec![
            ColumnInfo::ent_type(),
            ColumnInfo::id(),
            ColumnInfo::created_at(),
            ColumnInfo::updated_at(),
        ];
        columns.extend(fields.iter().map(|f| ColumnInfo::from_field(f, None)));
        let example_schema = match p.example_subclass_name() {
            Some(name) => {
                let sub = implementors
                    .iter()
                    .find(|s| s.descriptor_name == name)
                    .ok_or_else(|| ConfigError::MissingReference {
                        kind: "example subclass",
                        id: name.to_string(),
                    })?;
                Some(sub.base_name.clone())
            }
            None => implementors.first().map(|s| s.base_name.clone()),
        };
        pattern_by_name.insert(base.clone(), i);
        resolved_patterns.push(Arc::new(ResolvedPattern {
            descriptor_name: p.name().to_string(),
            module_name: module_name(&base),
            description: p.description().map(str::to_string),
            fields,
            implementors: implementors.iter().map(|s| s.base_name.clone()).collect(),
            view: StorageTable { name: view_name(&base), columns },
            members: implementors
                .iter()
                .map(|s| ViewMember {
                    discriminator: s.base_name.clone(),
                    table: s.table.name.clone(),
                })
                .collect(),
            example_schema,
            descriptor: p.clone(),
            base_name: base,
        }));
    }

    tracing::debug!(
        schemas = resolved_schemas.len(),
        patterns = resolved_patterns.len(),
        "registry resolved"
    );
    Ok(Registry {
        inner: Arc::new(RegistryInner {
            schemas: resolved_schemas,
            patterns: resolved_patterns,
            schema_by_name,
            pattern_by_name,
            schema_by_tag,
        }),
    })
}

fn storage_columns(fields: &[Field], tables: &HashMap<&str, String>) -> Vec<ColumnInfo> {
    let mut columns = vec![ColumnInfo::id(), ColumnInfo::created_at(), ColumnInfo::updated_at()];
    columns.extend(fields.iter().map(|f| {
        let references = f.edge().and_then(|e| tables.get(e.target.as_str()).cloned());
        ColumnInfo::from_field(f, references)
    }));
    columns
}
