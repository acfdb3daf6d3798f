//! Ent SDK: schema descriptors compiled into a privacy-checked entity layer.
//!
//! Descriptors ([`Schema`], [`Pattern`]) are registered into a [`Registry`], which
//! drives both the runtime protocol (loaders, mutators, queries, examples) and the
//! code generator that emits typed Rust wrappers over it.

pub mod case;
pub mod codegen;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod migration;
pub mod runtime;
pub mod sql;
pub mod store;

pub use chrono;
pub use serde_json;
pub use uuid;

pub use codegen::{generate, run, GeneratedFile};
pub use config::{
    ColumnInfo, EdgeTarget, GeneratorConfig, Registry, RegistryBuilder, ResolvedPattern, ResolvedSchema,
    StorageTable,
};
pub use descriptor::{sort_fields, CompositeIndex, Descriptor, Pattern, Schema};
pub use error::{ConfigError, EntError};
pub use field::{
    BoolField, DatetimeField, EdgeField, EntEnum, EnumField, Field, FieldKind, FieldValidator, FieldValue,
    Format, FromFieldValue, IntField, JsonField, LengthValidator, OneOf, PatternValidator, RangeValidator,
    StringField, TextField, TimeField, UuidField, WithDefault, WithDynamicExample, WithExample,
};
pub use migration::{apply_migrations, migration_plan};
pub use runtime::{
    generate_id, id_type_tag, type_tag, Action, AlwaysAllowRule, AlwaysDenyRule, CreateAction, Decision,
    DeleteAction, Ent, EntIdInput, EntQuery, ExampleBuilder, PatternHandle, PrivacyRule, SchemaHandle,
    UpdateAction, Vc, ViewerContext,
};
pub use store::{col, ColumnRef, Direction, MemorySession, PgSession, Predicate, Record, SelectQuery, Session};
