//! Pattern view unit: view DDL and one column reference per projected column.

use super::{ident, raw_str, Ctx, Source};
use crate::config::ResolvedPattern;
use crate::sql::ddl;

pub(crate) fn unit(ctx: &Ctx<'_>, pattern: &ResolvedPattern) -> String {
    let view = format!("{}View", pattern.base_name);
    let mut src = Source::default();
    ctx.header(&mut src, &pattern.descriptor_name);
    src.line(format!("use {}::ColumnRef;", ctx.rt()));
    src.blank();
    src.doc(&format!(
        "Union of every table implementing `I{}`, discriminated by `ent_type`.",
        pattern.base_name
    ));
    src.line(format!("pub struct {};", view));
    src.blank();
    src.open(format!("impl {}", view));
    src.line(format!("pub const VIEW_NAME: &'static str = {:?};", pattern.view.name));
    src.line(format!(
        "pub const CREATE_VIEW: &'static str = {};",
        raw_str(&ddl::create_view(pattern, None))
    ));
    src.line(format!(
        "pub const DROP_VIEW: &'static str = {};",
        raw_str(&ddl::drop_view(pattern, None))
    ));
    for column in pattern.view.column_names() {
        src.blank();
        src.open(format!("pub fn {}() -> ColumnRef", ident(column)));
        src.line(format!("ColumnRef::qualified(Self::VIEW_NAME, {:?})", column));
        src.close();
    }
    src.close();
    src.finish()
}
