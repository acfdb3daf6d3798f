//! Storage records: one struct per schema table, plus the abstract column set of a pattern.

use super::{ident, raw_str, Ctx, Source};
use crate::config::{ResolvedPattern, ResolvedSchema, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::field::Field;
use crate::sql::ddl;

fn decode_line(field: &Field) -> String {
    if field.nullable {
        format!("{}: record.get_as({:?}),", ident(&field.name), field.name)
    } else {
        format!("{}: record.require({:?})?,", ident(&field.name), field.name)
    }
}

fn statement_list(src: &mut Source, name: &str, statements: &[String]) {
    if statements.is_empty() {
        src.line(format!("const {}: &'static [&'static str] = &[];", name));
        return;
    }
    src.line(format!("const {}: &'static [&'static str] = &[", name));
    for s in statements {
        src.line(format!("    {},", raw_str(s)));
    }
    src.line("];");
}

pub(crate) fn schema_model(ctx: &Ctx<'_>, src: &mut Source, schema: &ResolvedSchema) {
    let model = format!("{}Model", schema.base_name);
    src.blank();
    src.doc(&format!("Row of `{}`.", schema.table.name));
    src.line("#[derive(Clone, Debug, PartialEq)]");
    src.open(format!("pub struct {}", model));
    src.line("pub id: Uuid,");
    src.line("pub created_at: DateTime<Utc>,");
    src.line("pub updated_at: DateTime<Utc>,");
    for field in &schema.fields {
        src.line(format!("pub {}: {},", ident(&field.name), ctx.stored_type(field)));
    }
    src.close();

    src.blank();
    src.open(format!("impl {} for {}", ctx.model_trait(), model));
    src.line(format!("const TABLE_NAME: &'static str = {:?};", schema.table.name));
    src.line(format!(
        "const CREATE_TABLE: &'static str = {};",
        raw_str(&ddl::create_table(&schema.table, None))
    ));
    statement_list(src, "CREATE_INDEXES", &ddl::create_indexes(schema, None));
    statement_list(src, "FOREIGN_KEYS", &ddl::foreign_keys(&schema.table, None));
    src.blank();
    src.open("fn from_record(record: &Record) -> Result<Self, EntError>");
    src.open("Ok(Self");
    src.line(format!("id: record.require({:?})?,", ID_COLUMN));
    src.line(format!("created_at: record.require({:?})?,", CREATED_AT_COLUMN));
    src.line(format!("updated_at: record.require({:?})?,", UPDATED_AT_COLUMN));
    for field in &schema.fields {
        src.line(decode_line(field));
    }
    src.close_with("})");
    src.close();
    src.close();

    src.blank();
    src.open(format!("impl {}", model));
    for (i, column) in schema.table.column_names().enumerate() {
        if i > 0 {
            src.blank();
        }
        src.open(format!("pub fn {}_column() -> ColumnRef", column));
        src.line(format!("ColumnRef::qualified(Self::TABLE_NAME, {:?})", column));
        src.close();
    }
    src.close();

    for pattern_base in &schema.patterns {
        let Some(pattern) = ctx.registry.resolved_pattern(pattern_base) else {
            continue;
        };
        src.blank();
        src.open(format!("impl From<&{}> for {}Model", model, pattern.base_name));
        src.open(format!("fn from(model: &{}) -> Self", model));
        src.open("Self");
        for field in &pattern.fields {
            let name = ident(&field.name);
            src.line(format!("{}: model.{}.clone(),", name, name));
        }
        src.close();
        src.close();
        src.close();
    }
}

pub(crate) fn pattern_model(ctx: &Ctx<'_>, src: &mut Source, pattern: &ResolvedPattern) {
    let model = format!("{}Model", pattern.base_name);
    src.blank();
    src.doc("Columns every implementing schema carries. There is no table of its own;");
    src.doc(&format!("rows are read through `{}`.", pattern.view.name));
    src.line("#[derive(Clone, Debug, PartialEq)]");
    src.open(format!("pub struct {}", model));
    for field in &pattern.fields {
        src.line(format!("pub {}: {},", ident(&field.name), ctx.stored_type(field)));
    }
    src.close();

    src.blank();
    src.open(format!("impl {}", model));
    src.open("pub fn from_record(record: &Record) -> Result<Self, EntError>");
    src.open("Ok(Self");
    for field in &pattern.fields {
        src.line(decode_line(field));
    }
    src.close_with("})");
    src.close();
    src.close();
}
