use crate::config::{CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::error::EntError;
use crate::field::{FieldValue, FromFieldValue};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

static NULL: FieldValue = FieldValue::Null;

/// One stored row: column name to value. Absent columns read as null.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record(BTreeMap<String, FieldValue>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> &FieldValue {
        self.0.get(column).unwrap_or(&NULL)
    }

    pub fn get_as<T: FromFieldValue>(&self, column: &str) -> Option<T> {
        T::from_field_value(self.get(column))
    }

    /// Typed value of a non-nullable column; a missing or mistyped value is a decode failure.
    pub fn require<T: FromFieldValue>(&self, column: &str) -> Result<T, EntError> {
        self.get_as(column).ok_or_else(|| {
            EntError::Execution(format!(
                "column {} holds {}, not the declared type",
                column,
                self.get(column).type_label()
            ))
        })
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<FieldValue> {
        self.0.remove(column)
    }

    pub fn id(&self) -> Option<Uuid> {
        self.get(ID_COLUMN).as_uuid()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.get_as(CREATED_AT_COLUMN)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.get_as(UPDATED_AT_COLUMN)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy `other`'s columns over this record's.
    pub fn merge(&mut self, other: &Record) {
        for (k, v) in other.iter() {
            self.0.insert(k.to_string(), v.clone());
        }
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}
