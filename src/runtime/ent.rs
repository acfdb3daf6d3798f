//! Privacy-checked entities and the per-descriptor handles that load them.

use crate::config::{EdgeTarget, Registry, ResolvedPattern, ResolvedSchema, StorageTable};
use crate::error::{ConfigError, EntError};
use crate::field::{FieldValue, FromFieldValue};
use crate::runtime::id::{id_type_tag, EntIdInput};
use crate::runtime::privacy::{self, Action, Decision, Vc};
use crate::runtime::{CreateAction, DeleteAction, EntQuery, ExampleBuilder, UpdateAction};
use crate::store::{col, Record, SelectQuery, Session};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A stored row of one concrete schema, visible to the viewer it was loaded for.
#[derive(Clone)]
pub struct Ent {
    schema: Arc<ResolvedSchema>,
    registry: Registry,
    vc: Vc,
    record: Record,
}

impl Ent {
    pub(crate) fn new(registry: Registry, schema: Arc<ResolvedSchema>, vc: Vc, record: Record) -> Self {
        Self { schema, registry, vc, record }
    }

    pub fn id(&self) -> Uuid {
        self.record.id().unwrap_or_default()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.record.created_at().unwrap_or_default()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.record.updated_at().unwrap_or_default()
    }

    /// Base name of the concrete schema, e.g. `EntTestObject`.
    pub fn type_name(&self) -> &str {
        &self.schema.base_name
    }

    pub fn schema(&self) -> &Arc<ResolvedSchema> {
        &self.schema
    }

    pub fn vc(&self) -> &Vc {
        &self.vc
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn get(&self, field: &str) -> &FieldValue {
        self.record.get(field)
    }

    pub fn get_as<T: FromFieldValue>(&self, field: &str) -> Option<T> {
        self.record.get_as(field)
    }

    /// Deserialize a JSON field into `T`; `None` when the field is null.
    pub fn get_json<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, EntError> {
        match self.record.get(field) {
            FieldValue::Json(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                EntError::Validation(format!("{}.{} does not decode: {}", self.schema.base_name, field, e))
            }),
            FieldValue::Null => Ok(None),
            other => Err(EntError::Validation(format!(
                "{}.{} holds {}, not json",
                self.schema.base_name,
                field,
                other.type_label()
            ))),
        }
    }

    /// Load the entity an edge points to, by edge name (`parent`) or column (`parent_id`).
    ///
    /// A nullable edge without an id yields `None`; a non-nullable edge whose target
    /// cannot be loaded is `NotFound`.
    pub async fn gen_edge(&self, session: &dyn Session, edge: &str) -> Result<Option<Ent>, EntError> {
        let field = self
            .schema
            .fields
            .iter()
            .find(|f| f.edge().is_some() && (f.original_name == edge || f.name == edge))
            .ok_or_else(|| {
                EntError::Validation(format!("{} has no edge {}", self.schema.base_name, edge))
            })?;
        let Some(info) = field.edge() else {
            return Ok(None);
        };
        let Some(id) = self.record.get(&field.name).as_uuid() else {
            if field.nullable {
                return Ok(None);
            }
            return Err(EntError::NotFound(format!(
                "{}.{} is not set on {}",
                self.schema.base_name,
                field.name,
                self.id()
            )));
        };
        let found = match self.registry.edge_target(&info.target) {
            Some(EdgeTarget::Schema(s)) => {
                SchemaHandle::new(self.registry.clone(), s.clone())
                    .gen(session, &self.vc, id)
                    .await?
            }
            Some(EdgeTarget::Pattern(p)) => {
                PatternHandle::new(self.registry.clone(), p.clone())
                    .gen(session, &self.vc, id)
                    .await?
            }
            None => {
                return Err(ConfigError::MissingReference {
                    kind: "edge target",
                    id: info.target.clone(),
                }
                .into())
            }
        };
        if found.is_none() && !field.nullable {
            return Err(EntError::NotFound(format!("{} {} not found", info.target, id)));
        }
        Ok(found)
    }
}

impl fmt::Debug for Ent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ent")
            .field("type", &self.schema.base_name)
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Handle for a schema, by base or descriptor name.
    pub fn schema(&self, name: &str) -> Result<SchemaHandle, EntError> {
        let schema = self
            .resolved_schema(name)
            .ok_or_else(|| ConfigError::MissingReference { kind: "schema", id: name.to_string() })?;
        Ok(SchemaHandle::new(self.clone(), schema.clone()))
    }

    pub fn pattern(&self, name: &str) -> Result<PatternHandle, EntError> {
        let pattern = self
            .resolved_pattern(name)
            .ok_or_else(|| ConfigError::MissingReference { kind: "pattern", id: name.to_string() })?;
        Ok(PatternHandle::new(self.clone(), pattern.clone()))
    }
}

/// Loaders, mutators, queries and examples of one schema.
#[derive(Clone, Debug)]
pub struct SchemaHandle {
    registry: Registry,
    schema: Arc<ResolvedSchema>,
}

impl SchemaHandle {
    pub(crate) fn new(registry: Registry, schema: Arc<ResolvedSchema>) -> Self {
        Self { registry, schema }
    }

    pub fn resolved(&self) -> &Arc<ResolvedSchema> {
        &self.schema
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn table(&self) -> &StorageTable {
        &self.schema.table
    }

    /// Wrap a row and run the read rules; `None` when privacy denies.
    pub(crate) async fn load_record(&self, vc: &Vc, record: Record) -> Result<Option<Ent>, EntError> {
        let ent = Ent::new(self.registry.clone(), self.schema.clone(), vc.clone(), record);
        let rules = self.schema.privacy_rules(Action::Read);
        let decision = privacy::evaluate(&rules, &**vc, &ent).await;
        if decision == Decision::Allow {
            Ok(Some(ent))
        } else {
            tracing::trace!(ent = %self.schema.base_name, id = %ent.id(), "read denied");
            Ok(None)
        }
    }

    /// `None` when the row does not exist or privacy denies it.
    pub async fn gen(
        &self,
        session: &dyn Session,
        vc: &Vc,
        id: impl Into<EntIdInput>,
    ) -> Result<Option<Ent>, EntError> {
        let id = id.into().parse()?;
        match session.fetch_by_id(&self.schema.table, id).await? {
            Some(record) => self.load_record(vc, record).await,
            None => Ok(None),
        }
    }

    pub async fn genx(&self, session: &dyn Session, vc: &Vc, id: impl Into<EntIdInput>) -> Result<Ent, EntError> {
        let id = id.into().parse()?;
        self.gen(session, vc, id)
            .await?
            .ok_or_else(|| EntError::NotFound(format!("{} {} not found", self.schema.base_name, id)))
    }

    /// Load by a unique field's value.
    pub async fn gen_from_unique(
        &self,
        session: &dyn Session,
        vc: &Vc,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Option<Ent>, EntError> {
        let field = self
            .schema
            .field(field)
            .filter(|f| f.unique)
            .ok_or_else(|| {
                EntError::Validation(format!("{}.{} is not a unique field", self.schema.base_name, field))
            })?;
        let value = field.kind.coerce(value.into()).map_err(|reason| {
            EntError::Validation(format!(
                "Invalid value for {}.{}: {}",
                self.schema.base_name, field.name, reason
            ))
        })?;
        let mut query = SelectQuery::new(self.schema.table.clone());
        query.predicate = Some(col(&field.name).eq(value));
        query.limit = Some(1);
        match session.select(&query).await?.into_iter().next() {
            Some(record) => self.load_record(vc, record).await,
            None => Ok(None),
        }
    }

    pub async fn genx_from_unique(
        &self,
        session: &dyn Session,
        vc: &Vc,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Ent, EntError> {
        let value = value.into();
        let shown = value.to_string();
        self.gen_from_unique(session, vc, field, value).await?.ok_or_else(|| {
            EntError::NotFound(format!("{} with {} = {} not found", self.schema.base_name, field, shown))
        })
    }

    pub fn create(&self, vc: &Vc) -> CreateAction {
        CreateAction::new(self.clone(), vc.clone())
    }

    pub fn update(&self, vc: &Vc, ent: &Ent) -> UpdateAction {
        UpdateAction::new(self.clone(), vc.clone(), ent.clone())
    }

    pub fn delete(&self, vc: &Vc, ent: &Ent) -> DeleteAction {
        DeleteAction::new(self.clone(), vc.clone(), ent.clone())
    }

    pub fn query(&self, vc: &Vc) -> EntQuery {
        EntQuery::for_schema(self.registry.clone(), self.schema.clone(), vc.clone())
    }

    pub fn example(&self, vc: &Vc) -> ExampleBuilder {
        ExampleBuilder::new(self.clone(), vc.clone())
    }
}

/// Polymorphic access through a pattern: ids dispatch on their type tag.
#[derive(Clone, Debug)]
pub struct PatternHandle {
    registry: Registry,
    pattern: Arc<ResolvedPattern>,
}

impl PatternHandle {
    pub(crate) fn new(registry: Registry, pattern: Arc<ResolvedPattern>) -> Self {
        Self { registry, pattern }
    }

    pub fn resolved(&self) -> &Arc<ResolvedPattern> {
        &self.pattern
    }

    pub fn view(&self) -> &StorageTable {
        &self.pattern.view
    }

    /// Concrete schema owning `id`. An unregistered tag is a programming error.
    pub fn schema_for_id(&self, id: Uuid) -> Result<Option<SchemaHandle>, EntError> {
        let tag = id_type_tag(id);
        let schema = self
            .registry
            .schema_for_tag(tag)
            .ok_or(EntError::UnknownTypeTag { tag, id })?;
        if !schema.implements(&self.pattern.base_name) {
            return Ok(None);
        }
        Ok(Some(SchemaHandle::new(self.registry.clone(), schema.clone())))
    }

    /// Delegates to the owning schema's loader; `None` when the owner does not
    /// implement this pattern, the row is missing, or privacy denies.
    pub async fn gen(
        &self,
        session: &dyn Session,
        vc: &Vc,
        id: impl Into<EntIdInput>,
    ) -> Result<Option<Ent>, EntError> {
        let id = id.into().parse()?;
        match self.schema_for_id(id)? {
            Some(handle) => handle.gen(session, vc, id).await,
            None => Ok(None),
        }
    }

    pub async fn genx(&self, session: &dyn Session, vc: &Vc, id: impl Into<EntIdInput>) -> Result<Ent, EntError> {
        let id = id.into().parse()?;
        self.gen(session, vc, id)
            .await?
            .ok_or_else(|| EntError::NotFound(format!("{} {} not found", self.pattern.base_name, id)))
    }

    /// Update restricted to the pattern's fields.
    pub fn update(&self, vc: &Vc, ent: &Ent) -> UpdateAction {
        let handle = SchemaHandle::new(self.registry.clone(), ent.schema().clone());
        let allowed = self.pattern.fields.iter().map(|f| f.name.clone()).collect();
        UpdateAction::new(handle, vc.clone(), ent.clone()).restricted_to(allowed)
    }

    pub fn delete(&self, vc: &Vc, ent: &Ent) -> DeleteAction {
        let handle = SchemaHandle::new(self.registry.clone(), ent.schema().clone());
        DeleteAction::new(handle, vc.clone(), ent.clone())
    }

    pub fn query(&self, vc: &Vc) -> EntQuery {
        EntQuery::for_pattern(self.registry.clone(), self.pattern.clone(), vc.clone())
    }

    /// Example of the pattern's example schema.
    pub fn example(&self, vc: &Vc) -> Result<ExampleBuilder, EntError> {
        let name = self.pattern.example_schema.as_deref().ok_or_else(|| {
            EntError::Validation(format!("{} has no implementing schema", self.pattern.base_name))
        })?;
        Ok(self.registry.schema(name)?.example(vc))
    }
}
