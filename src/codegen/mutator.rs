//! Mutators: typed create/update/delete actions, each committed by `save`.

use super::{ident, Ctx, Source};
use crate::config::{ResolvedPattern, ResolvedSchema};
use crate::field::Field;

/// Setter methods on an update action, one per mutable field.
fn update_setters(ctx: &Ctx<'_>, src: &mut Source, fields: &[&Field]) {
    for field in fields {
        src.blank();
        src.open(format!(
            "pub fn set_{}(mut self, value: {}) -> Self",
            field.name,
            ctx.stored_type(field)
        ));
        src.line(format!("self.action = self.action.set({:?}, value);", field.name));
        src.line("self");
        src.close();
    }
}

fn action_struct(src: &mut Source, name: &str, inner: &str) {
    src.blank();
    src.open(format!("pub struct {}", name));
    src.line(format!("action: {},", inner));
    src.close();
}

pub(crate) fn schema_mutator(ctx: &Ctx<'_>, src: &mut Source, schema: &ResolvedSchema) {
    let base = &schema.base_name;
    let mutator = format!("{}Mutator", base);

    src.blank();
    src.line(format!("pub struct {};", mutator));
    src.blank();
    src.open(format!("impl {}", mutator));

    // Arguments follow the field order: mandatory, defaulted, nullable.
    let mut params = vec![format!("vc: {}", ctx.vc())];
    for field in &schema.fields {
        let ty = if field.has_default() && !field.nullable {
            format!("Option<{}>", ctx.value_type(&field.kind))
        } else {
            ctx.stored_type(field)
        };
        params.push(format!("{}: {}", ident(&field.name), ty));
    }
    src.doc("Defaulted fields take `None` to keep their default.");
    src.open(format!(
        "pub fn create({}) -> Result<{}MutatorCreationAction, EntError>",
        params.join(", "),
        base
    ));
    src.line(format!("let mut action = {}::handle()?.create(&erase_vc(vc));", base));
    for field in &schema.fields {
        let name = ident(&field.name);
        if field.has_default() {
            src.open(format!("if let Some(value) = {}", name));
            src.line(format!("action = action.set({:?}, value);", field.name));
            src.close();
        } else {
            src.line(format!("action = action.set({:?}, {});", field.name, name));
        }
    }
    src.line(format!("Ok({}MutatorCreationAction {{ action }})", base));
    src.close();

    if !schema.immutable {
        src.blank();
        src.doc("Starts from the entity's current values; only fields set afterwards are written.");
        src.open(format!(
            "pub fn update(vc: {}, ent: &{}) -> Result<{}MutatorUpdateAction, EntError>",
            ctx.vc(),
            base,
            base
        ));
        src.line(format!(
            "Ok({}MutatorUpdateAction {{ action: {}::handle()?.update(&erase_vc(vc), ent.ent()) }})",
            base, base
        ));
        src.close();
    }

    src.blank();
    src.open(format!(
        "pub fn delete(vc: {}, ent: &{}) -> Result<{}MutatorDeletionAction, EntError>",
        ctx.vc(),
        base,
        base
    ));
    src.line(format!(
        "Ok({}MutatorDeletionAction {{ action: {}::handle()?.delete(&erase_vc(vc), ent.ent()) }})",
        base, base
    ));
    src.close();
    src.close();

    let creation = format!("{}MutatorCreationAction", base);
    action_struct(src, &creation, "CreateAction");
    src.blank();
    src.open(format!("impl {}", creation));
    src.open("pub fn with_id(mut self, id: Uuid) -> Self");
    src.line("self.action = self.action.with_id(id);");
    src.line("self");
    src.close();
    src.blank();
    src.open("pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self");
    src.line("self.action = self.action.with_created_at(created_at);");
    src.line("self");
    src.close();
    src.blank();
    src.open(format!("pub async fn save(self, session: {}) -> Result<{}, EntError>", ctx.session(), base));
    src.line(format!("{}::from_ent(self.action.save(session).await?)", base));
    src.close();
    src.close();

    if !schema.immutable {
        let update = format!("{}MutatorUpdateAction", base);
        action_struct(src, &update, "UpdateAction");
        src.blank();
        src.open(format!("impl {}", update));
        let mutable: Vec<&Field> = schema.mutable_fields().collect();
        src.open("pub fn action(&self) -> &UpdateAction");
        src.line("&self.action");
        src.close();
        update_setters(ctx, src, &mutable);
        src.blank();
        src.open(format!("pub async fn save(self, session: {}) -> Result<{}, EntError>", ctx.session(), base));
        src.line(format!("{}::from_ent(self.action.save(session).await?)", base));
        src.close();
        src.close();
    }

    let deletion = format!("{}MutatorDeletionAction", base);
    action_struct(src, &deletion, "DeleteAction");
    src.blank();
    src.open(format!("impl {}", deletion));
    src.open(format!("pub async fn save(self, session: {}) -> Result<(), EntError>", ctx.session()));
    src.line("self.action.save(session).await");
    src.close();
    src.close();
}

/// Update and delete through the interface; updates only reach the pattern's fields.
pub(crate) fn pattern_mutator(ctx: &Ctx<'_>, src: &mut Source, pattern: &ResolvedPattern) {
    let base = &pattern.base_name;
    let mutator = format!("I{}Mutator", base);

    src.blank();
    src.line(format!("pub struct {};", mutator));
    src.blank();
    src.open(format!("impl {}", mutator));
    src.open(format!(
        "pub fn update(vc: {}, ent: &{}) -> Result<{}UpdateAction, EntError>",
        ctx.vc(),
        base,
        mutator
    ));
    src.line(format!(
        "Ok({}UpdateAction {{ action: {}::handle()?.update(&erase_vc(vc), ent.ent()) }})",
        mutator, base
    ));
    src.close();
    src.blank();
    src.open(format!(
        "pub fn delete(vc: {}, ent: &{}) -> Result<{}DeletionAction, EntError>",
        ctx.vc(),
        base,
        mutator
    ));
    src.line(format!(
        "Ok({}DeletionAction {{ action: {}::handle()?.delete(&erase_vc(vc), ent.ent()) }})",
        mutator, base
    ));
    src.close();
    src.close();

    let update = format!("{}UpdateAction", mutator);
    action_struct(src, &update, "UpdateAction");
    src.blank();
    src.open(format!("impl {}", update));
    src.open("pub fn action(&self) -> &UpdateAction");
    src.line("&self.action");
    src.close();
    let mutable: Vec<&Field> = pattern.fields.iter().filter(|f| !f.immutable).collect();
    update_setters(ctx, src, &mutable);
    src.blank();
    src.open(format!("pub async fn save(self, session: {}) -> Result<{}, EntError>", ctx.session(), base));
    src.line(format!("{}::from_ent(self.action.save(session).await?)", base));
    src.close();
    src.close();

    let deletion = format!("{}DeletionAction", mutator);
    action_struct(src, &deletion, "DeleteAction");
    src.blank();
    src.open(format!("impl {}", deletion));
    src.open(format!("pub async fn save(self, session: {}) -> Result<(), EntError>", ctx.session()));
    src.line("self.action.save(session).await");
    src.close();
    src.close();
}
