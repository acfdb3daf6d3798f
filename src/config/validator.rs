//! Registration checks: naming, referential integrity, field-name uniqueness.

use crate::case::{base_name, module_name, table_name, view_name};
use crate::config::resolved::{CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::descriptor::{Pattern, Schema};
use crate::error::ConfigError;
use crate::field::Field;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const RESERVED_COLUMNS: [&str; 3] = [ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN];

/// Generated units that every run emits next to the descriptor units.
const SHARED_UNITS: [&str; 4] = ["ent_model", "ent_query", "all_models", "mod"];

pub fn validate(schemas: &[Arc<dyn Schema>], patterns: &[Arc<dyn Pattern>]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for s in schemas {
        check_name(s.name(), "Schema")?;
        if !seen.insert(s.name()) {
            return Err(ConfigError::DuplicateDescriptor(s.name().to_string()));
        }
    }
    for p in patterns {
        check_name(p.name(), "Pattern")?;
        if !seen.insert(p.name()) {
            return Err(ConfigError::DuplicateDescriptor(p.name().to_string()));
        }
    }

    check_name_collisions(schemas, patterns)?;

    for p in patterns {
        let fields = p.fields();
        check_unique_fields(p.name(), &fields)?;
        check_edges(&fields, &seen)?;
    }

    for s in schemas {
        for p in s.patterns() {
            if !patterns.iter().any(|registered| registered.name() == p.name()) {
                return Err(ConfigError::MissingReference {
                    kind: "pattern",
                    id: p.name().to_string(),
                });
            }
        }
        let fields = s.all_fields();
        check_unique_fields(s.name(), &fields)?;
        check_edges(&fields, &seen)?;
        let names: HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        for index in s.composite_indexes() {
            if index.field_names.is_empty() {
                return Err(ConfigError::Validation(format!("index '{}' has no fields", index.name)));
            }
            for field in &index.field_names {
                if !names.contains(field.as_str()) && !RESERVED_COLUMNS.contains(&field.as_str()) {
                    return Err(ConfigError::UnknownIndexField {
                        index: index.name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn check_name(name: &str, suffix: &'static str) -> Result<(), ConfigError> {
    let valid = base_name(name, suffix)
        .map(|base| base.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidDescriptorName { name: name.to_string(), suffix })
    }
}

/// Every descriptor must own its lookup names, its generated units and its relations.
fn check_name_collisions(schemas: &[Arc<dyn Schema>], patterns: &[Arc<dyn Pattern>]) -> Result<(), ConfigError> {
    let mut units: HashMap<String, &str> = SHARED_UNITS.iter().map(|u| (u.to_string(), "ent-sdk")).collect();
    let mut relations = HashMap::new();
    let mut schema_names = HashMap::new();
    let mut pattern_names = HashMap::new();
    for s in schemas {
        let base = base_name(s.name(), "Schema").unwrap_or(s.name());
        claim(&mut schema_names, "schema name", base.to_string(), s.name())?;
        claim(&mut schema_names, "schema name", s.name().to_string(), s.name())?;
        claim(&mut units, "generated module", module_name(base), s.name())?;
        claim(&mut relations, "table", table_name(base), s.name())?;
    }
    for p in patterns {
        let base = base_name(p.name(), "Pattern").unwrap_or(p.name());
        claim(&mut pattern_names, "pattern name", base.to_string(), p.name())?;
        claim(&mut pattern_names, "pattern name", p.name().to_string(), p.name())?;
        claim(&mut units, "generated module", module_name(base), p.name())?;
        claim(&mut units, "generated module", view_name(base), p.name())?;
        claim(&mut relations, "view", view_name(base), p.name())?;
    }
    Ok(())
}

fn claim<'a>(
    taken: &mut HashMap<String, &'a str>,
    kind: &'static str,
    name: String,
    owner: &'a str,
) -> Result<(), ConfigError> {
    match taken.entry(name) {
        Entry::Occupied(entry) => Err(ConfigError::NameCollision {
            kind,
            name: entry.key().clone(),
            first: entry.get().to_string(),
            second: owner.to_string(),
        }),
        Entry::Vacant(entry) => {
            entry.insert(owner);
            Ok(())
        }
    }
}

fn check_unique_fields(descriptor: &str, fields: &[Field]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for f in fields {
        if RESERVED_COLUMNS.contains(&f.name.as_str()) || !seen.insert(f.name.as_str()) {
            return Err(ConfigError::DuplicateField {
                descriptor: descriptor.to_string(),
                field: f.name.clone(),
            });
        }
    }
    Ok(())
}

fn check_edges(fields: &[Field], registered: &HashSet<&str>) -> Result<(), ConfigError> {
    for f in fields {
        if let Some(edge) = f.edge() {
            if !registered.contains(edge.target.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "edge target",
                    id: edge.target.clone(),
                });
            }
        }
    }
    Ok(())
}
