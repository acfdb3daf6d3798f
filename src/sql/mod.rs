//! SQL rendering: identifiers come from resolved descriptors only, values are parameters.

mod builder;
pub mod ddl;
pub mod params;

pub use builder::*;
pub use params::*;

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Optionally schema-qualified name.
pub fn qualified(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(schema) => format!("{}.{}", quoted(schema), quoted(name)),
        None => quoted(name),
    }
}
