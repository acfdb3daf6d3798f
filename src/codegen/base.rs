//! Shared units: storage base trait, typed query, type-tag table and module index.

use super::{raw_str, tag_literal, Ctx, Source};
use crate::sql::ddl::registry_ddl;

pub(crate) fn ent_model(ctx: &Ctx<'_>) -> String {
    let rt = ctx.rt();
    let mut src = Source::default();
    ctx.header(&mut src, "the registry");
    src.line(format!("use {}::{{EntError, Record, Vc}};", rt));
    src.line(ctx.vc_use());
    src.line("use std::sync::Arc;");
    src.blank();
    src.doc("Storage record of one schema table.");
    src.open(format!("pub trait {}: Sized", ctx.model_trait()));
    src.line("const TABLE_NAME: &'static str;");
    src.line("const CREATE_TABLE: &'static str;");
    src.line("const CREATE_INDEXES: &'static [&'static str];");
    src.line("const FOREIGN_KEYS: &'static [&'static str];");
    src.blank();
    src.line("fn from_record(record: &Record) -> Result<Self, EntError>;");
    src.close();
    src.blank();
    src.open(format!("pub fn erase_vc(vc: &Arc<{}>) -> Vc", ctx.config.vc_name));
    src.line("vc.clone()");
    src.close();
    src.finish()
}

pub(crate) fn ent_query(ctx: &Ctx<'_>) -> String {
    let rt = ctx.rt();
    let mut src = Source::default();
    ctx.header(&mut src, "the registry");
    src.line(format!(
        "use {}::{{ColumnRef, Direction, Ent, EntError, EntQuery, Predicate, StorageTable}};",
        rt
    ));
    src.line(format!("use {}::Session;", rt));
    src.line("use std::marker::PhantomData;");
    src.blank();
    src.doc("Typed view of a loaded entity.");
    src.open("pub trait FromEnt: Sized");
    src.line("fn from_ent(ent: Ent) -> Result<Self, EntError>;");
    src.close();
    src.blank();
    src.doc("Fluent query returning `T`. Builder methods mutate and return the same query.");
    src.open("pub struct TypedQuery<T>");
    src.line("inner: EntQuery,");
    src.line("_marker: PhantomData<fn() -> T>,");
    src.close();

    src.blank();
    src.open("impl<T: FromEnt> TypedQuery<T>");
    src.open("pub fn new(inner: EntQuery) -> Self");
    src.line("Self { inner, _marker: PhantomData }");
    src.close();
    src.blank();
    src.open("pub fn inner(&self) -> &EntQuery");
    src.line("&self.inner");
    src.close();

    let builders: [(&str, &str, &str); 7] = [
        ("join", "table: &StorageTable, on: Predicate", "join(table, on)"),
        ("where_", "predicate: Predicate", "where_(predicate)"),
        ("order_by", "column: ColumnRef, direction: Direction", "order_by(column, direction)"),
        ("order_by_id_asc", "", "order_by_id_asc()"),
        ("order_by_id_desc", "", "order_by_id_desc()"),
        ("limit", "limit: u64", "limit(limit)"),
        ("offset", "offset: u64", "offset(offset)"),
    ];
    for (name, params, call) in builders {
        let params = if params.is_empty() { String::new() } else { format!(", {}", params) };
        src.blank();
        src.open(format!("pub fn {}(&mut self{}) -> &mut Self", name, params));
        src.line(format!("self.inner.{};", call));
        src.line("self");
        src.close();
    }

    let session = ctx.session();
    src.blank();
    src.open(format!("pub async fn gen(&self, session: {}) -> Result<Vec<T>, EntError>", session));
    src.line("self.inner.gen(session).await?.into_iter().map(T::from_ent).collect()");
    src.close();
    src.blank();
    src.open(format!("pub async fn gen_first(&self, session: {}) -> Result<Option<T>, EntError>", session));
    src.line("self.inner.gen_first(session).await?.map(T::from_ent).transpose()");
    src.close();
    src.blank();
    src.open(format!("pub async fn genx_first(&self, session: {}) -> Result<T, EntError>", session));
    src.line("T::from_ent(self.inner.genx_first(session).await?)");
    src.close();
    src.blank();
    src.doc("Counts every matching row, including rows the viewer may not see.");
    src.open(format!("pub async fn gen_count_no_privacy(&self, session: {}) -> Result<i64, EntError>", session));
    src.line("self.inner.gen_count_no_privacy(session).await");
    src.close();
    src.close();
    src.finish()
}

pub(crate) fn all_models(ctx: &Ctx<'_>) -> String {
    let rt = ctx.rt();
    let descriptors = &ctx.config.descriptors_path;
    let mut src = Source::default();
    ctx.header(&mut src, "the registry");
    src.line(format!("use {}::uuid::Uuid;", rt));
    src.line(format!("use {}::{{id_type_tag, EntError, Registry}};", rt));
    src.line("use std::sync::OnceLock;");

    src.blank();
    src.doc("Type tag of every schema, by name.");
    src.line("pub const TYPE_TAGS: &[([u8; 2], &str)] = &[");
    for schema in ctx.registry.schemas() {
        src.line(format!("    ({}, {:?}),", tag_literal(schema.type_tag), schema.base_name));
    }
    src.line("];");

    src.blank();
    src.open("pub fn type_name_for_tag(tag: [u8; 2]) -> Option<&'static str>");
    src.line("TYPE_TAGS.iter().find(|(t, _)| *t == tag).map(|(_, name)| *name)");
    src.close();
    src.blank();
    src.doc("Concrete type an id belongs to, read from its embedded tag.");
    src.open("pub fn type_name_for_id(id: Uuid) -> Option<&'static str>");
    src.line("type_name_for_tag(id_type_tag(id))");
    src.close();

    src.blank();
    src.line("static REGISTRY: OnceLock<Registry> = OnceLock::new();");
    src.blank();
    src.doc("Registry of every descriptor, built on first use.");
    src.open("pub fn registry() -> Result<&'static Registry, EntError>");
    src.open("if let Some(registry) = REGISTRY.get()");
    src.line("return Ok(registry);");
    src.close();
    src.line("let built = Registry::builder()");
    for pattern in ctx.registry.patterns() {
        src.line(format!("    .pattern({}::{})", descriptors, pattern.descriptor_name));
    }
    for schema in ctx.registry.schemas() {
        src.line(format!("    .schema({}::{})", descriptors, schema.descriptor_name));
    }
    src.line("    .build()?;");
    src.line("Ok(REGISTRY.get_or_init(|| built))");
    src.close();

    src.blank();
    src.doc("Enum types, tables, indexes, foreign keys, then pattern views.");
    src.line("pub const MIGRATIONS: &[&str] = &[");
    for statement in registry_ddl(ctx.registry, None) {
        src.line(format!("    {},", raw_str(&statement.sql)));
    }
    src.line("];");
    src.finish()
}

pub(crate) fn mod_rs(ctx: &Ctx<'_>) -> String {
    let mut modules: Vec<String> = vec![
        "all_models".to_string(),
        "ent_model".to_string(),
        "ent_query".to_string(),
    ];
    for schema in ctx.registry.schemas() {
        modules.push(schema.module_name.clone());
    }
    for pattern in ctx.registry.patterns() {
        modules.push(pattern.module_name.clone());
        modules.push(crate::case::view_name(&pattern.base_name));
    }
    modules.sort();
    modules.dedup();

    let mut src = Source::default();
    src.line("// @generated by ent-sdk. Do not edit.");
    src.blank();
    for module in modules {
        src.line(format!("pub mod {};", module));
    }
    src.finish()
}
