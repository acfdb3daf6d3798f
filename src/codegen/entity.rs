//! Entity wrapper of a schema: accessors, edge loaders, privacy-checked loaders,
//! and the explicit delegation implementing each pattern interface.

use super::{ident, tag_literal, Ctx, Source};
use crate::config::ResolvedSchema;
use crate::error::ConfigError;
use crate::field::Field;
use std::collections::{BTreeMap, BTreeSet};

pub(crate) fn imports(ctx: &Ctx<'_>, src: &mut Source, schema: &ResolvedSchema) -> Result<(), ConfigError> {
    ctx.runtime_imports(src);
    let mut siblings: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for field in &schema.fields {
        if let Some(edge) = field.edge() {
            let (module, ty) = ctx.edge_target(edge)?;
            if module != schema.module_name {
                siblings.entry(module).or_default().insert(ty);
            }
        }
    }
    for pattern_base in &schema.patterns {
        if let Some(pattern) = ctx.registry.resolved_pattern(pattern_base) {
            let items = siblings.entry(pattern.module_name.clone()).or_default();
            items.insert(pattern.base_name.clone());
            items.insert(format!("{}Model", pattern.base_name));
            items.insert(format!("I{}", pattern.base_name));
        }
    }
    for (module, items) in siblings {
        let items: Vec<String> = items.into_iter().collect();
        src.line(format!("use super::{}::{{{}}};", module, items.join(", ")));
    }
    Ok(())
}

/// Async loader `gen_<edge>` reading through `ent_expr`.
pub(crate) fn edge_loader(
    ctx: &Ctx<'_>,
    src: &mut Source,
    owner: &str,
    field: &Field,
    ent_expr: &str,
) -> Result<(), ConfigError> {
    let Some(edge) = field.edge() else {
        return Ok(());
    };
    let (_, target) = ctx.edge_target(edge)?;
    let loader = format!("gen_{}", field.original_name);
    let call = format!("{}.gen_edge(session, {:?}).await?", ent_expr, field.original_name);
    if field.nullable {
        src.open(format!(
            "pub async fn {}(&self, session: {}) -> Result<Option<{}>, EntError>",
            loader,
            ctx.session(),
            target
        ));
        src.open(format!("match {}", call));
        src.line(format!("Some(ent) => Ok(Some({}::from_ent(ent)?)),", target));
        src.line("None => Ok(None),");
        src.close();
    } else {
        src.open(format!(
            "pub async fn {}(&self, session: {}) -> Result<{}, EntError>",
            loader,
            ctx.session(),
            target
        ));
        src.open(format!("let ent = {}.ok_or_else(||", call));
        src.line(format!(
            "EntError::NotFound(format!(\"{}.{} {{}} not found\", {}.id()))",
            owner, field.original_name, ent_expr
        ));
        src.close_with("})?;");
        src.line(format!("{}::from_ent(ent)", target));
    }
    src.close();
    Ok(())
}

/// `gen`/`genx` over a handle returned by `Self::handle()`.
pub(crate) fn id_loaders(ctx: &Ctx<'_>, src: &mut Source) {
    src.doc("`None` when the row is missing or the viewer may not see it.");
    src.open(format!(
        "pub async fn gen(session: {}, vc: {}, id: impl Into<EntIdInput>) -> Result<Option<Self>, EntError>",
        ctx.session(),
        ctx.vc()
    ));
    src.line("Self::handle()?.gen(session, &erase_vc(vc), id).await?.map(Self::from_ent).transpose()");
    src.close();
    src.blank();
    src.open(format!(
        "pub async fn genx(session: {}, vc: {}, id: impl Into<EntIdInput>) -> Result<Self, EntError>",
        ctx.session(),
        ctx.vc()
    ));
    src.line("Self::from_ent(Self::handle()?.genx(session, &erase_vc(vc), id).await?)");
    src.close();
}

pub(crate) fn emit(ctx: &Ctx<'_>, src: &mut Source, schema: &ResolvedSchema) -> Result<(), ConfigError> {
    let base = &schema.base_name;
    let model = format!("{}Model", base);

    src.blank();
    if let Some(description) = &schema.description {
        src.doc(description);
    }
    src.line("#[derive(Clone, Debug)]");
    src.open(format!("pub struct {}", base));
    src.line("ent: Ent,");
    src.line(format!("model: {},", model));
    src.close();

    src.blank();
    src.open(format!("impl FromEnt for {}", base));
    src.open("fn from_ent(ent: Ent) -> Result<Self, EntError>");
    src.line(format!("let model = {}::from_record(ent.record())?;", model));
    src.line("Ok(Self { ent, model })");
    src.close();
    src.close();

    src.blank();
    src.open(format!("impl {}", base));
    src.line(format!("pub const TYPE_NAME: &'static str = {:?};", base));
    src.line(format!("pub const TYPE_TAG: [u8; 2] = {};", tag_literal(schema.type_tag)));
    src.blank();
    src.open("pub fn handle() -> Result<SchemaHandle, EntError>");
    src.line("registry()?.schema(Self::TYPE_NAME)");
    src.close();
    src.blank();
    src.open("pub fn storage_table() -> Result<StorageTable, EntError>");
    src.line("Ok(Self::handle()?.table().clone())");
    src.close();
    src.blank();
    src.open("pub fn ent(&self) -> &Ent");
    src.line("&self.ent");
    src.close();
    src.blank();
    src.open(format!("pub fn model(&self) -> &{}", model));
    src.line("&self.model");
    src.close();
    src.blank();
    src.open("pub fn vc(&self) -> &Vc");
    src.line("self.ent.vc()");
    src.close();
    src.blank();
    src.open("pub fn id(&self) -> Uuid");
    src.line("self.model.id");
    src.close();
    src.blank();
    src.open("pub fn created_at(&self) -> DateTime<Utc>");
    src.line("self.model.created_at");
    src.close();
    src.blank();
    src.open("pub fn updated_at(&self) -> DateTime<Utc>");
    src.line("self.model.updated_at");
    src.close();

    for field in &schema.fields {
        let (ret, body) = ctx.accessor(field);
        src.blank();
        if let Some(description) = &field.description {
            src.doc(description);
        }
        src.open(format!("pub fn {}(&self) -> {}", ident(&field.name), ret));
        src.line(body);
        src.close();
        if let crate::field::FieldKind::Json { type_hint: Some(hint) } = &field.kind {
            src.blank();
            src.open(format!(
                "pub fn {}_typed(&self) -> Result<Option<{}>, EntError>",
                field.name, hint
            ));
            src.line(format!("self.ent.get_json({:?})", field.name));
            src.close();
        }
    }

    for field in schema.fields.iter().filter(|f| f.edge().is_some()) {
        src.blank();
        edge_loader(ctx, src, base, field, "self.ent")?;
    }

    src.blank();
    id_loaders(ctx, src);

    for field in schema.unique_fields() {
        let name = &field.name;
        let value = ctx.value_type(&field.kind);
        src.blank();
        src.open(format!(
            "pub async fn gen_from_{}(session: {}, vc: {}, {}: {}) -> Result<Option<Self>, EntError>",
            name,
            ctx.session(),
            ctx.vc(),
            ident(name),
            value
        ));
        src.line(format!(
            "Self::handle()?.gen_from_unique(session, &erase_vc(vc), {:?}, {}).await?.map(Self::from_ent).transpose()",
            name,
            ident(name)
        ));
        src.close();
        src.blank();
        src.open(format!(
            "pub async fn genx_from_{}(session: {}, vc: {}, {}: {}) -> Result<Self, EntError>",
            name,
            ctx.session(),
            ctx.vc(),
            ident(name),
            value
        ));
        src.line(format!(
            "Self::from_ent(Self::handle()?.genx_from_unique(session, &erase_vc(vc), {:?}, {}).await?)",
            name,
            ident(name)
        ));
        src.close();
    }

    src.blank();
    src.open(format!("pub fn query(vc: {}) -> Result<{}Query, EntError>", ctx.vc(), base));
    src.line("Ok(TypedQuery::new(Self::handle()?.query(&erase_vc(vc))))");
    src.close();
    src.close();

    for pattern_base in &schema.patterns {
        let Some(pattern) = ctx.registry.resolved_pattern(pattern_base) else {
            continue;
        };
        src.blank();
        src.open(format!("impl I{} for {}", pattern.base_name, base));
        src.open("fn ent(&self) -> &Ent");
        src.line(format!("{}::ent(self)", base));
        src.close();
        for name in ["id", "created_at", "updated_at"] {
            let ret = if name == "id" { "Uuid" } else { "DateTime<Utc>" };
            src.blank();
            src.open(format!("fn {}(&self) -> {}", name, ret));
            src.line(format!("{}::{}(self)", base, name));
            src.close();
        }
        for field in &pattern.fields {
            let (ret, _) = ctx.accessor(field);
            let name = ident(&field.name);
            src.blank();
            src.open(format!("fn {}(&self) -> {}", name, ret));
            src.line(format!("{}::{}(self)", base, name));
            src.close();
        }
        src.close();
    }
    Ok(())
}
