//! Fixture synthesis: fill every field from the caller, the field's examples,
//! or a freshly synthesized edge target, then create through the mutator.

use crate::config::{EdgeTarget, ResolvedSchema};
use crate::error::EntError;
use crate::field::{Field, FieldValue};
use crate::runtime::privacy::Vc;
use crate::runtime::{Ent, SchemaHandle};
use crate::store::Session;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

type SaveFuture<'a> = Pin<Box<dyn Future<Output = Result<Ent, EntError>> + Send + 'a>>;

pub struct ExampleBuilder {
    handle: SchemaHandle,
    vc: Vc,
    explicit: BTreeMap<String, FieldValue>,
    id: Option<Uuid>,
    created_at: Option<DateTime<Utc>>,
}

/// Target schema to synthesize for an edge, or `None` when the edge must be supplied
/// by the caller: synthesis is off, or the target is this schema or a pattern it implements.
fn synthesis_target(handle: &SchemaHandle, field: &Field) -> Option<SchemaHandle> {
    let info = field.edge().filter(|e| e.generate_example)?;
    let schema: &ResolvedSchema = handle.resolved();
    let registry = handle.registry();
    match registry.edge_target(&info.target)? {
        EdgeTarget::Schema(target) if target.base_name == schema.base_name => None,
        EdgeTarget::Schema(target) => Some(SchemaHandle::new(registry.clone(), target.clone())),
        EdgeTarget::Pattern(pattern) if schema.implements(&pattern.base_name) => None,
        EdgeTarget::Pattern(pattern) => {
            let name = pattern.example_schema.as_deref()?;
            registry.schema(name).ok()
        }
    }
}

impl ExampleBuilder {
    pub(crate) fn new(handle: SchemaHandle, vc: Vc) -> Self {
        Self { handle, vc, explicit: BTreeMap::new(), id: None, created_at: None }
    }

    /// Explicit values win over every other source. `Null` is stored as given,
    /// except on an edge whose target would be synthesized: that edge is synthesized.
    pub fn set(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.explicit.insert(field.to_string(), value.into());
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    fn explicit_value(&mut self, field: &Field) -> Option<FieldValue> {
        self.explicit
            .remove(&field.name)
            .or_else(|| self.explicit.remove(&field.original_name))
    }

    /// Boxed so that edge synthesis can recurse into the target's factory.
    pub fn save<'a>(mut self, session: &'a dyn Session) -> SaveFuture<'a> {
        Box::pin(async move {
            let schema = self.handle.resolved().clone();
            let mut create = self.handle.create(&self.vc);
            for field in &schema.fields {
                let explicit = self.explicit_value(field);
                let null_edge =
                    field.edge().is_some() && explicit.as_ref().map_or(false, FieldValue::is_null);
                if let Some(value) = explicit.filter(|_| !null_edge) {
                    create = create.set(&field.name, value);
                } else if null_edge && synthesis_target(&self.handle, field).is_none() {
                    create = create.set(&field.name, FieldValue::Null);
                } else if let Some(value) = field.next_example() {
                    create = create.set(&field.name, value);
                } else if let Some(target) = synthesis_target(&self.handle, field) {
                    let created = target.example(&self.vc).save(session).await?;
                    tracing::trace!(
                        ent = %schema.base_name,
                        edge = %field.original_name,
                        target = %created.type_name(),
                        "synthesized edge target"
                    );
                    create = create.set(&field.name, created.id());
                }
            }
            // Leftovers are unknown names; the mutator reports them.
            for (name, value) in std::mem::take(&mut self.explicit) {
                create = create.set(&name, value);
            }
            if let Some(id) = self.id {
                create = create.with_id(id);
            }
            if let Some(created_at) = self.created_at {
                create = create.with_created_at(created_at);
            }
            create.save(session).await
        })
    }
}
