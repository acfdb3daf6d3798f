//! DDL for the resolved registry: enum types, tables, indexes, deferred foreign
//! keys and pattern views. Order of [`registry_ddl`] follows PostgreSQL dependencies.

use crate::case::to_snake_case;
use crate::config::{
    ColumnInfo, Registry, ResolvedPattern, ResolvedSchema, StorageTable, ENT_TYPE_COLUMN, ID_COLUMN,
};
use crate::field::{EnumInfo, FieldKind};
use crate::sql::{qualified, quoted};
use std::collections::BTreeMap;

/// Column type, with enum types qualified by `schema`.
pub fn column_type(column: &ColumnInfo, schema: Option<&str>) -> String {
    match &column.kind {
        FieldKind::Enum(info) => qualified(schema, &to_snake_case(info.type_name)),
        _ => column.pg_type(),
    }
}

pub fn create_enum_type(info: &EnumInfo, schema: Option<&str>) -> String {
    let values: Vec<String> = info
        .variants
        .iter()
        .map(|v| format!("'{}'", v.replace('\'', "''")))
        .collect();
    format!(
        "CREATE TYPE {} AS ENUM ({})",
        qualified(schema, &to_snake_case(info.type_name)),
        values.join(", ")
    )
}

fn column_def(column: &ColumnInfo, schema: Option<&str>) -> String {
    let mut def = format!("{} {}", quoted(&column.name), column_type(column, schema));
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    if column.unique {
        def.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        def.push_str(" DEFAULT ");
        def.push_str(&default.to_sql_literal());
    }
    def
}

pub fn create_table(table: &StorageTable, schema: Option<&str>) -> String {
    let mut defs: Vec<String> = table.columns.iter().map(|c| column_def(c, schema)).collect();
    let pk: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| quoted(&c.name))
        .collect();
    defs.push(format!("PRIMARY KEY ({})", pk.join(", ")));
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        qualified(schema, &table.name),
        defs.join(",\n    ")
    )
}

/// Single-column indexes for indexed fields, then one per composite index.
pub fn create_indexes(resolved: &ResolvedSchema, schema: Option<&str>) -> Vec<String> {
    let table = qualified(schema, &resolved.table.name);
    let mut out: Vec<String> = resolved
        .table
        .columns
        .iter()
        .filter(|c| c.indexed)
        .map(|c| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("ix_{}_{}", resolved.table.name, c.name)),
                table,
                quoted(&c.name)
            )
        })
        .collect();
    for index in &resolved.composite_indexes {
        let columns: Vec<String> = index.field_names.iter().map(|f| quoted(f)).collect();
        out.push(format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            quoted(&index.name),
            table,
            columns.join(", ")
        ));
    }
    out
}

/// Foreign keys to schema tables, checked at commit so rows may reference each other.
pub fn foreign_keys(table: &StorageTable, schema: Option<&str>) -> Vec<String> {
    table
        .columns
        .iter()
        .filter_map(|c| c.references.as_ref().map(|target| (c, target)))
        .map(|(c, target)| {
            format!(
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) DEFERRABLE INITIALLY DEFERRED",
                qualified(schema, &table.name),
                quoted(&format!("fk_{}_{}", table.name, c.name)),
                quoted(&c.name),
                qualified(schema, target),
                quoted(ID_COLUMN)
            )
        })
        .collect()
}

/// Union-all view over every implementing schema's table.
pub fn create_view(pattern: &ResolvedPattern, schema: Option<&str>) -> String {
    let branches: Vec<String> = if pattern.members.is_empty() {
        let columns: Vec<String> = pattern
            .view
            .columns
            .iter()
            .map(|c| format!("NULL::{} AS {}", column_type(c, schema), quoted(&c.name)))
            .collect();
        vec![format!("SELECT {} WHERE FALSE", columns.join(", "))]
    } else {
        pattern
            .members
            .iter()
            .map(|member| {
                let columns: Vec<String> = pattern
                    .view
                    .columns
                    .iter()
                    .map(|c| {
                        if c.name == ENT_TYPE_COLUMN {
                            format!(
                                "'{}'::text AS {}",
                                member.discriminator.replace('\'', "''"),
                                quoted(ENT_TYPE_COLUMN)
                            )
                        } else {
                            quoted(&c.name)
                        }
                    })
                    .collect();
                format!("SELECT {} FROM {}", columns.join(", "), qualified(schema, &member.table))
            })
            .collect()
    };
    format!(
        "CREATE OR REPLACE VIEW {} AS\n{}",
        qualified(schema, &pattern.view.name),
        branches.join("\nUNION ALL\n")
    )
}

pub fn drop_view(pattern: &ResolvedPattern, schema: Option<&str>) -> String {
    format!("DROP VIEW IF EXISTS {}", qualified(schema, &pattern.view.name))
}

/// Every enum type used by a registered field, keyed (and deduplicated) by SQL type name.
pub fn enum_types(registry: &Registry) -> Vec<EnumInfo> {
    let mut types = BTreeMap::new();
    let fields = registry
        .schemas()
        .iter()
        .flat_map(|s| s.fields.iter())
        .chain(registry.patterns().iter().flat_map(|p| p.fields.iter()));
    for field in fields {
        if let FieldKind::Enum(info) = &field.kind {
            types.entry(to_snake_case(info.type_name)).or_insert_with(|| info.clone());
        }
    }
    types.into_values().collect()
}

/// One labeled statement of a migration plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DdlStatement {
    pub sql: String,
    /// Fails when the object already exists; safe to ignore on re-runs.
    pub may_exist: bool,
}

impl DdlStatement {
    fn new(sql: String) -> Self {
        Self { sql, may_exist: false }
    }

    fn existing_ok(sql: String) -> Self {
        Self { sql, may_exist: true }
    }
}

/// Full migration plan: enum types, tables, indexes, foreign keys, views.
pub fn registry_ddl(registry: &Registry, schema: Option<&str>) -> Vec<DdlStatement> {
    let mut out: Vec<DdlStatement> = enum_types(registry)
        .iter()
        .map(|info| DdlStatement::existing_ok(create_enum_type(info, schema)))
        .collect();
    for s in registry.schemas() {
        out.push(DdlStatement::new(create_table(&s.table, schema)));
    }
    for s in registry.schemas() {
        out.extend(create_indexes(s, schema).into_iter().map(DdlStatement::new));
    }
    for s in registry.schemas() {
        out.extend(foreign_keys(&s.table, schema).into_iter().map(DdlStatement::existing_ok));
    }
    for p in registry.patterns() {
        out.push(DdlStatement::new(create_view(p, schema)));
    }
    out
}
