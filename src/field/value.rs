//! Runtime value of a single field, shared by descriptors (examples, defaults),
//! records, predicates and SQL parameters.

use crate::error::EntError;
use crate::field::EntEnum;
use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    Datetime(DateTime<Utc>),
    Time(NaiveTime),
    Uuid(Uuid),
    /// Variant name of an [`EntEnum`].
    Enum(String),
    Json(serde_json::Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn from_enum<E: EntEnum>(value: E) -> Self {
        FieldValue::Enum(value.as_str().to_string())
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, EntError> {
        serde_json::to_value(value)
            .map(FieldValue::Json)
            .map_err(|e| EntError::Validation(format!("value is not representable as JSON: {}", e)))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) | FieldValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn type_label(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::String(_) => "string",
            FieldValue::Datetime(_) => "datetime",
            FieldValue::Time(_) => "time",
            FieldValue::Uuid(_) => "uuid",
            FieldValue::Enum(_) => "enum",
            FieldValue::Json(_) => "json",
        }
    }

    /// SQL-style ordering: values of different kinds, nulls and JSON documents are incomparable.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::String(a), FieldValue::String(b))
            | (FieldValue::Enum(a), FieldValue::Enum(b))
            | (FieldValue::String(a), FieldValue::Enum(b))
            | (FieldValue::Enum(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Datetime(a), FieldValue::Datetime(b)) => Some(a.cmp(b)),
            (FieldValue::Time(a), FieldValue::Time(b)) => Some(a.cmp(b)),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Int(n) => serde_json::Value::Number((*n).into()),
            FieldValue::String(s) | FieldValue::Enum(s) => serde_json::Value::String(s.clone()),
            FieldValue::Datetime(d) => {
                serde_json::Value::String(d.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            FieldValue::Time(t) => serde_json::Value::String(t.format("%H:%M:%S%.f").to_string()),
            FieldValue::Uuid(u) => serde_json::Value::String(u.to_string()),
            FieldValue::Json(v) => v.clone(),
        }
    }

    /// Literal usable in DDL (column DEFAULT clauses).
    pub fn to_sql_literal(&self) -> String {
        match self {
            FieldValue::Null => "NULL".into(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Json(v) => format!("'{}'::jsonb", escape_sql(&v.to_string())),
            other => format!("'{}'", escape_sql(&other.to_string())),
        }
    }
}

fn escape_sql(s: &str) -> String {
    s.replace('\'', "''")
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::String(s) | FieldValue::Enum(s) => f.write_str(s),
            FieldValue::Datetime(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Micros, true)),
            FieldValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            FieldValue::Uuid(u) => write!(f, "{}", u),
            FieldValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        FieldValue::String(v.clone())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Datetime(v)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(v: NaiveTime) -> Self {
        FieldValue::Time(v)
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        FieldValue::Uuid(v)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Json(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Typed extraction used by generated storage records.
pub trait FromFieldValue: Sized {
    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

impl FromFieldValue for bool {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromFieldValue for i64 {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_i64()
    }
}

impl FromFieldValue for String {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromFieldValue for DateTime<Utc> {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Datetime(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromFieldValue for NaiveTime {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl FromFieldValue for Uuid {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_uuid()
    }
}

impl FromFieldValue for serde_json::Value {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => None,
            other => Some(other.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_and_mixed_kinds_do_not_compare() {
        assert_eq!(FieldValue::Null.compare(&FieldValue::Null), None);
        assert_eq!(FieldValue::Int(1).compare(&FieldValue::String("1".into())), None);
        assert_eq!(
            FieldValue::Enum("A".into()).compare(&FieldValue::String("B".into())),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn sql_literals_escape_quotes() {
        assert_eq!(FieldValue::from("O'Neil").to_sql_literal(), "'O''Neil'");
        assert_eq!(FieldValue::Bool(true).to_sql_literal(), "true");
        assert_eq!(
            FieldValue::Json(serde_json::json!(["a"])).to_sql_literal(),
            "'[\"a\"]'::jsonb"
        );
    }

    #[test]
    fn time_literals_keep_fractional_seconds() {
        let t = NaiveTime::from_hms_milli_opt(9, 30, 15, 250).unwrap();
        assert_eq!(FieldValue::Time(t).to_sql_literal(), "'09:30:15.250'");
        let whole = NaiveTime::from_hms_opt(9, 30, 15).unwrap();
        assert_eq!(FieldValue::Time(whole).to_sql_literal(), "'09:30:15'");
    }
}
