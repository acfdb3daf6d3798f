//! Descriptor model. A [`Schema`] is a concrete stored entity type; a [`Pattern`] is a
//! reusable field set with its own privacy rules, mixed into schemas by composition.
//!
//! ```ignore
//! struct EntUserSchema;
//!
//! impl Descriptor for EntUserSchema {
//!     fn name(&self) -> &'static str { "EntUserSchema" }
//!     fn fields(&self) -> Vec<Field> {
//!         vec![StringField::new("email", 100).not_null().unique().into()]
//!     }
//!     fn privacy_rules(&self, _action: Action) -> Vec<Arc<dyn PrivacyRule>> {
//!         vec![Arc::new(AlwaysAllowRule)]
//!     }
//! }
//!
//! impl Schema for EntUserSchema {}
//! ```

mod ordering;

pub use ordering::sort_fields;

use crate::field::Field;
use crate::runtime::privacy::{Action, PrivacyRule};
use std::sync::Arc;

pub trait Descriptor: Send + Sync + 'static {
    /// Type name, `Ent<Base>Schema` or `Ent<Base>Pattern`.
    fn name(&self) -> &'static str;

    fn fields(&self) -> Vec<Field>;

    fn description(&self) -> Option<&'static str> {
        None
    }

    /// Rules for `action`, in evaluation order. No rules means every check denies.
    fn privacy_rules(&self, _action: Action) -> Vec<Arc<dyn PrivacyRule>> {
        Vec::new()
    }

    fn sorted_fields(&self) -> Vec<Field> {
        sort_fields(self.fields())
    }
}

pub trait Schema: Descriptor {
    fn patterns(&self) -> Vec<Arc<dyn Pattern>> {
        Vec::new()
    }

    fn composite_indexes(&self) -> Vec<CompositeIndex> {
        Vec::new()
    }

    /// Immutable schemas get no update mutator.
    fn is_immutable(&self) -> bool {
        false
    }

    /// Own fields merged with every pattern's fields, in storage order.
    fn all_fields(&self) -> Vec<Field> {
        let mut fields = self.fields();
        for pattern in self.patterns() {
            fields.extend(pattern.fields());
        }
        sort_fields(fields)
    }
}

pub trait Pattern: Descriptor {
    /// Descriptor name of the schema the example factory instantiates when an edge
    /// targets this pattern. Defaults to the first implementing schema by name.
    fn example_subclass_name(&self) -> Option<&'static str> {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeIndex {
    pub name: String,
    pub field_names: Vec<String>,
    pub unique: bool,
}

impl CompositeIndex {
    pub fn new(name: &str, field_names: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            field_names: field_names.iter().map(|f| f.to_string()).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}
