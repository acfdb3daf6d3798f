//! Typed errors: registration/generation time and runtime.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Raised while registering descriptors or generating code. Any of these aborts the run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate descriptor: {0}")]
    DuplicateDescriptor(String),
    #[error("invalid descriptor name '{name}': expected Ent*{suffix}")]
    InvalidDescriptorName { name: String, suffix: &'static str },
    #[error("duplicate field '{field}' in {descriptor}")]
    DuplicateField { descriptor: String, field: String },
    #[error("index '{index}' references unknown field '{field}'")]
    UnknownIndexField { index: String, field: String },
    #[error("{kind} '{name}' is produced by both {first} and {second}")]
    NameCollision { kind: &'static str, name: String, first: String, second: String },
    #[error("type tag {tag:02x?} shared by {first} and {second}")]
    TypeTagCollision { tag: [u8; 2], first: String, second: String },
    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum EntError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("execution: {0}")]
    Execution(String),
    /// The id carries a tag that no registered schema owns. Every generated id embeds a
    /// registered tag, so this indicates a programming error rather than a missing row.
    #[error("unknown type tag {tag:02x?} in id {id}")]
    UnknownTypeTag { tag: [u8; 2], id: Uuid },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl EntError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EntError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, EntError::Validation(_))
    }
}
