//! Query aliases over the shared typed query in `ent_query.rs`.

use super::Source;
use crate::config::{ResolvedPattern, ResolvedSchema};

pub(crate) fn schema_query(src: &mut Source, schema: &ResolvedSchema) {
    src.blank();
    src.doc(&format!("Query over `{}`.", schema.table.name));
    src.line(format!("pub type {}Query = TypedQuery<{}>;", schema.base_name, schema.base_name));
}

pub(crate) fn pattern_query(src: &mut Source, pattern: &ResolvedPattern) {
    src.blank();
    src.doc(&format!(
        "Query over `{}`; each row is loaded through its owning schema.",
        pattern.view.name
    ));
    src.line(format!("pub type I{}Query = TypedQuery<{}>;", pattern.base_name, pattern.base_name));
}
