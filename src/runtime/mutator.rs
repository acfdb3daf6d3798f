//! Pending create/update/delete actions, each committed by `save`.

use crate::config::{ResolvedSchema, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::error::EntError;
use crate::field::{Field, FieldValue};
use crate::runtime::id::generate_id;
use crate::runtime::privacy::Vc;
use crate::runtime::{Ent, SchemaHandle};
use crate::store::{Record, Session};
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Resolve a caller-facing name (`parent` or `parent_id`) to the field.
fn lookup<'a>(schema: &'a ResolvedSchema, name: &str) -> Option<&'a Field> {
    schema.field(name).or_else(|| {
        schema
            .fields
            .iter()
            .find(|f| f.edge().is_some() && f.original_name == name)
    })
}

/// Coerce, check nullability, then run the field's validators.
fn check_value(schema: &ResolvedSchema, field: &Field, value: FieldValue) -> Result<FieldValue, EntError> {
    let value = field.kind.coerce(value).map_err(|reason| {
        EntError::Validation(format!(
            "Invalid value for {}.{}: {}",
            schema.base_name, field.name, reason
        ))
    })?;
    if value.is_null() {
        if !field.nullable {
            return Err(EntError::Validation(format!(
                "Missing value for {}.{}",
                schema.base_name, field.name
            )));
        }
        return Ok(value);
    }
    if !field.validate(&value) {
        return Err(EntError::Validation(format!(
            "Invalid value for {}.{}",
            schema.base_name, field.name
        )));
    }
    Ok(value)
}

async fn reload(handle: &SchemaHandle, session: &dyn Session, vc: &Vc, id: Uuid) -> Result<Ent, EntError> {
    handle.gen(session, vc, id).await?.ok_or_else(|| {
        EntError::NotFound(format!(
            "{} {} is not visible after save",
            handle.resolved().base_name,
            id
        ))
    })
}

pub struct CreateAction {
    handle: SchemaHandle,
    vc: Vc,
    values: Vec<(String, FieldValue)>,
    id: Option<Uuid>,
    created_at: Option<DateTime<Utc>>,
}

impl CreateAction {
    pub(crate) fn new(handle: SchemaHandle, vc: Vc) -> Self {
        Self { handle, vc, values: Vec::new(), id: None, created_at: None }
    }

    pub fn set(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.values.push((field.to_string(), value.into()));
        self
    }

    /// Use this id instead of generating one.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Validate, insert, then reload through the read rules.
    pub async fn save(self, session: &dyn Session) -> Result<Ent, EntError> {
        let schema = self.handle.resolved().clone();
        let mut provided = Record::new();
        for (name, value) in self.values {
            let field = lookup(&schema, &name).ok_or_else(|| {
                EntError::Validation(format!("Unknown field {}.{}", schema.base_name, name))
            })?;
            provided.set(field.name.as_str(), value);
        }

        let created_at = self.created_at.unwrap_or_else(Utc::now).trunc_subsecs(6);
        let id = self.id.unwrap_or_else(|| generate_id(schema.type_tag, created_at));
        let mut record = Record::new();
        record.set(ID_COLUMN, id);
        record.set(CREATED_AT_COLUMN, created_at);
        record.set(UPDATED_AT_COLUMN, created_at);
        for field in &schema.fields {
            let value = if provided.contains(&field.name) {
                provided.get(&field.name).clone()
            } else {
                field.default_value().cloned().unwrap_or(FieldValue::Null)
            };
            record.set(field.name.as_str(), check_value(&schema, field, value)?);
        }

        session.insert(&schema.table, &record).await?;
        tracing::debug!(ent = %schema.base_name, id = %id, "created");
        reload(&self.handle, session, &self.vc, id).await
    }
}

pub struct UpdateAction {
    handle: SchemaHandle,
    vc: Vc,
    ent: Ent,
    values: Record,
    dirty: BTreeSet<String>,
    allowed: Option<BTreeSet<String>>,
    rejected: Option<String>,
}

impl UpdateAction {
    /// Pre-populated with the entity's current mutable values.
    pub(crate) fn new(handle: SchemaHandle, vc: Vc, ent: Ent) -> Self {
        let values = handle
            .resolved()
            .mutable_fields()
            .map(|f| (f.name.clone(), ent.get(&f.name).clone()))
            .collect();
        Self {
            handle,
            vc,
            ent,
            values,
            dirty: BTreeSet::new(),
            allowed: None,
            rejected: None,
        }
    }

    pub fn vc(&self) -> &Vc {
        &self.vc
    }

    pub(crate) fn restricted_to(mut self, fields: BTreeSet<String>) -> Self {
        self.allowed = Some(fields);
        self
    }

    /// Pending value of a field, as it will be written.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.values.get(field)
    }

    /// Setting an immutable or unknown field fails the save.
    pub fn set(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        let schema = self.handle.resolved().clone();
        let target = lookup(&schema, field)
            .filter(|f| self.allowed.as_ref().map_or(true, |a| a.contains(&f.name)));
        match target {
            Some(f) if !f.immutable => {
                self.values.set(f.name.as_str(), value);
                self.dirty.insert(f.name.clone());
            }
            Some(f) => {
                self.rejected.get_or_insert_with(|| {
                    format!("{}.{} is immutable", schema.base_name, f.name)
                });
            }
            None => {
                self.rejected
                    .get_or_insert_with(|| format!("Unknown field {}.{}", schema.base_name, field));
            }
        }
        self
    }

    /// Validate every mutable field, write the changed ones, then reload.
    pub async fn save(self, session: &dyn Session) -> Result<Ent, EntError> {
        let schema = self.handle.resolved().clone();
        if schema.immutable {
            return Err(EntError::Validation(format!("{} is immutable", schema.base_name)));
        }
        if let Some(reason) = self.rejected {
            return Err(EntError::Validation(reason));
        }
        let mut changes = Record::new();
        for field in schema.mutable_fields() {
            let value = check_value(&schema, field, self.values.get(&field.name).clone())?;
            if self.dirty.contains(&field.name) {
                changes.set(field.name.as_str(), value);
            }
        }
        changes.set(UPDATED_AT_COLUMN, Utc::now().trunc_subsecs(6));

        let id = self.ent.id();
        session.update(&schema.table, id, &changes).await?;
        tracing::debug!(ent = %schema.base_name, id = %id, fields = ?self.dirty, "updated");
        reload(&self.handle, session, &self.vc, id).await
    }
}

pub struct DeleteAction {
    handle: SchemaHandle,
    vc: Vc,
    ent: Ent,
}

impl DeleteAction {
    pub(crate) fn new(handle: SchemaHandle, vc: Vc, ent: Ent) -> Self {
        Self { handle, vc, ent }
    }

    pub fn vc(&self) -> &Vc {
        &self.vc
    }

    pub async fn save(self, session: &dyn Session) -> Result<(), EntError> {
        let schema = self.handle.resolved();
        session.delete(&schema.table, self.ent.id()).await?;
        tracing::debug!(ent = %schema.base_name, id = %self.ent.id(), "deleted");
        Ok(())
    }
}
