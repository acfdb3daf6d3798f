//! Example factories for fixtures and tests.

use super::{ident, Ctx, Source};
use crate::config::{ResolvedPattern, ResolvedSchema};

pub(crate) fn schema_example(ctx: &Ctx<'_>, src: &mut Source, schema: &ResolvedSchema) {
    let base = &schema.base_name;
    let fields = format!("{}ExampleFields", base);

    src.blank();
    src.doc("Explicit values for an example; unset fields fall back to the field's");
    src.doc("example, then to a synthesized edge target. `Some(None)` stores null, except");
    src.doc("on an edge that synthesizes its target.");
    src.line("#[derive(Clone, Debug, Default)]");
    src.open(format!("pub struct {}", fields));
    src.line("pub id: Option<Uuid>,");
    src.line("pub created_at: Option<DateTime<Utc>>,");
    for field in &schema.fields {
        src.line(format!("pub {}: Option<{}>,", ident(&field.name), ctx.stored_type(field)));
    }
    src.close();

    src.blank();
    src.line(format!("pub struct {}Example;", base));
    src.blank();
    src.open(format!("impl {}Example", base));
    src.open(format!(
        "pub async fn gen(session: {}, vc: {}) -> Result<{}, EntError>",
        ctx.session(),
        ctx.vc(),
        base
    ));
    src.line(format!("Self::gen_with(session, vc, {}::default()).await", fields));
    src.close();
    src.blank();
    src.open(format!(
        "pub async fn gen_with(session: {}, vc: {}, fields: {}) -> Result<{}, EntError>",
        ctx.session(),
        ctx.vc(),
        fields,
        base
    ));
    src.line(format!("let mut example = {}::handle()?.example(&erase_vc(vc));", base));
    src.open("if let Some(id) = fields.id");
    src.line("example = example.with_id(id);");
    src.close();
    src.open("if let Some(created_at) = fields.created_at");
    src.line("example = example.with_created_at(created_at);");
    src.close();
    for field in &schema.fields {
        src.open(format!("if let Some(value) = fields.{}", ident(&field.name)));
        src.line(format!("example = example.set({:?}, value);", field.name));
        src.close();
    }
    src.line(format!("{}::from_ent(example.save(session).await?)", base));
    src.close();
    src.close();
}

/// Examples of a pattern instantiate its designated implementing schema.
pub(crate) fn pattern_example(ctx: &Ctx<'_>, src: &mut Source, pattern: &ResolvedPattern) {
    let base = &pattern.base_name;
    src.blank();
    src.line(format!("pub struct I{}Example;", base));
    src.blank();
    src.open(format!("impl I{}Example", base));
    src.open(format!(
        "pub async fn gen(session: {}, vc: {}) -> Result<{}, EntError>",
        ctx.session(),
        ctx.vc(),
        base
    ));
    src.line(format!(
        "{}::from_ent({}::handle()?.example(&erase_vc(vc))?.save(session).await?)",
        base, base
    ));
    src.close();
    src.close();
}
