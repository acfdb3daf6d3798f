//! Pattern unit: abstract model, interface trait, polymorphic entity enum and the
//! interface-level mutator, query and example.

use super::entity::{edge_loader, id_loaders};
use super::{example, ident, mutator, query, storage, Ctx, Source};
use crate::config::{ResolvedPattern, ResolvedSchema};
use crate::error::ConfigError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

fn implementors(ctx: &Ctx<'_>, pattern: &ResolvedPattern) -> Vec<Arc<ResolvedSchema>> {
    pattern
        .implementors
        .iter()
        .filter_map(|name| ctx.registry.resolved_schema(name).cloned())
        .collect()
}

/// `match self { .. }` delegating `call` to every variant.
fn delegate(src: &mut Source, schemas: &[Arc<ResolvedSchema>], call: &str) {
    if schemas.is_empty() {
        src.line("match *self {}");
        return;
    }
    src.open("match self");
    for schema in schemas {
        src.line(format!("Self::{}(inner) => inner.{},", schema.base_name, call));
    }
    src.close();
}

pub(crate) fn unit(ctx: &Ctx<'_>, pattern: &ResolvedPattern) -> Result<String, ConfigError> {
    let base = &pattern.base_name;
    let schemas = implementors(ctx, pattern);
    let mut src = Source::default();
    ctx.header(&mut src, &pattern.descriptor_name);
    ctx.runtime_imports(&mut src);

    let mut siblings: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for schema in &schemas {
        siblings
            .entry(schema.module_name.clone())
            .or_default()
            .insert(schema.base_name.clone());
    }
    for field in &pattern.fields {
        if let Some(edge) = field.edge() {
            let (module, ty) = ctx.edge_target(edge)?;
            if module != pattern.module_name {
                siblings.entry(module).or_default().insert(ty);
            }
        }
    }
    for (module, items) in siblings {
        let items: Vec<String> = items.into_iter().collect();
        src.line(format!("use super::{}::{{{}}};", module, items.join(", ")));
    }

    storage::pattern_model(ctx, &mut src, pattern);

    src.blank();
    if let Some(description) = &pattern.description {
        src.doc(description);
    }
    src.open(format!("pub trait I{}", base));
    src.line("fn ent(&self) -> &Ent;");
    src.line("fn id(&self) -> Uuid;");
    src.line("fn created_at(&self) -> DateTime<Utc>;");
    src.line("fn updated_at(&self) -> DateTime<Utc>;");
    for field in &pattern.fields {
        let (ret, _) = ctx.accessor(field);
        src.line(format!("fn {}(&self) -> {};", ident(&field.name), ret));
    }
    src.close();

    src.blank();
    src.doc(&format!("Any entity implementing `I{}`.", base));
    src.line("#[derive(Clone, Debug)]");
    src.open(format!("pub enum {}", base));
    for schema in &schemas {
        src.line(format!("{}({}),", schema.base_name, schema.base_name));
    }
    src.close();

    src.blank();
    src.open(format!("impl FromEnt for {}", base));
    src.open("fn from_ent(ent: Ent) -> Result<Self, EntError>");
    src.open("match ent.type_name()");
    for schema in &schemas {
        src.line(format!(
            "{:?} => Ok(Self::{}({}::from_ent(ent)?)),",
            schema.base_name, schema.base_name, schema.base_name
        ));
    }
    src.line(format!(
        "other => Err(EntError::Validation(format!(\"{{}} does not implement {}\", other))),",
        base
    ));
    src.close();
    src.close();
    src.close();

    src.blank();
    src.open(format!("impl {}", base));
    src.line(format!("pub const TYPE_NAME: &'static str = {:?};", base));
    src.line(format!("pub const VIEW_NAME: &'static str = {:?};", pattern.view.name));
    src.blank();
    src.open("pub fn handle() -> Result<PatternHandle, EntError>");
    src.line("registry()?.pattern(Self::TYPE_NAME)");
    src.close();
    src.blank();
    src.open("pub fn ent(&self) -> &Ent");
    delegate(&mut src, &schemas, "ent()");
    src.close();
    src.blank();
    src.open("pub fn id(&self) -> Uuid");
    src.line("self.ent().id()");
    src.close();
    src.blank();
    src.open("pub fn type_name(&self) -> &str");
    src.line("self.ent().type_name()");
    src.close();
    for field in pattern.fields.iter().filter(|f| f.edge().is_some()) {
        src.blank();
        edge_loader(ctx, &mut src, base, field, "self.ent()")?;
    }
    src.blank();
    src.doc("Dispatches on the id's type tag to the owning schema's loader.");
    id_loaders(ctx, &mut src);
    src.blank();
    src.open(format!("pub fn query(vc: {}) -> Result<I{}Query, EntError>", ctx.vc(), base));
    src.line("Ok(TypedQuery::new(Self::handle()?.query(&erase_vc(vc))))");
    src.close();
    src.close();

    src.blank();
    src.open(format!("impl I{} for {}", base, base));
    src.open("fn ent(&self) -> &Ent");
    delegate(&mut src, &schemas, "ent()");
    src.close();
    for (name, ret) in [("id", "Uuid"), ("created_at", "DateTime<Utc>"), ("updated_at", "DateTime<Utc>")] {
        src.blank();
        src.open(format!("fn {}(&self) -> {}", name, ret));
        delegate(&mut src, &schemas, &format!("{}()", name));
        src.close();
    }
    for field in &pattern.fields {
        let (ret, _) = ctx.accessor(field);
        let name = ident(&field.name);
        src.blank();
        src.open(format!("fn {}(&self) -> {}", name, ret));
        delegate(&mut src, &schemas, &format!("{}()", name));
        src.close();
    }
    src.close();

    mutator::pattern_mutator(ctx, &mut src, pattern);
    query::pattern_query(&mut src, pattern);
    example::pattern_example(ctx, &mut src, pattern);
    tracing::info!(pattern = %pattern.descriptor_name, implementors = schemas.len(), "rendered pattern");
    Ok(src.finish())
}
