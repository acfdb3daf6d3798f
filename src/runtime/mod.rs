//! The entity protocol, driven by resolved descriptors: privacy, identity
//! tagging, loaders, mutators, queries and example synthesis.

mod ent;
mod example;
pub mod id;
mod mutator;
pub mod privacy;
mod query;

pub use ent::{Ent, PatternHandle, SchemaHandle};
pub use example::ExampleBuilder;
pub use id::{generate_id, id_type_tag, type_tag, EntIdInput, TAG_OFFSET};
pub use mutator::{CreateAction, DeleteAction, UpdateAction};
pub use privacy::{Action, AlwaysAllowRule, AlwaysDenyRule, Decision, PrivacyRule, Vc, ViewerContext};
pub use query::EntQuery;
