//! Field validators. A validator is a predicate over a non-null value; any failing
//! validator rejects the mutation with "Invalid value for X.f".
//!
//! Built-ins fail closed on values of the wrong kind. Nulls never reach a validator:
//! nullability is checked separately by the mutator.

use crate::error::ConfigError;
use crate::field::FieldValue;
use regex::Regex;

pub trait FieldValidator: Send + Sync {
    fn validate(&self, value: &FieldValue) -> bool;
}

impl<F> FieldValidator for F
where
    F: Fn(&FieldValue) -> bool + Send + Sync,
{
    fn validate(&self, value: &FieldValue) -> bool {
        self(value)
    }
}

/// String must match the regular expression.
pub struct PatternValidator {
    re: Regex,
}

impl PatternValidator {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(pattern)
            .map_err(|e| ConfigError::Validation(format!("invalid pattern '{}': {}", pattern, e)))?;
        Ok(Self { re })
    }
}

impl FieldValidator for PatternValidator {
    fn validate(&self, value: &FieldValue) -> bool {
        value.as_str().map(|s| self.re.is_match(s)).unwrap_or(false)
    }
}

/// Character-count bounds on a string.
#[derive(Clone, Copy, Debug, Default)]
pub struct LengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl LengthValidator {
    pub fn between(min: usize, max: usize) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    pub fn at_most(max: usize) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub fn at_least(min: usize) -> Self {
        Self { min: Some(min), max: None }
    }
}

impl FieldValidator for LengthValidator {
    fn validate(&self, value: &FieldValue) -> bool {
        let Some(s) = value.as_str() else {
            return false;
        };
        let len = s.chars().count();
        self.min.map_or(true, |min| len >= min) && self.max.map_or(true, |max| len <= max)
    }
}

/// Inclusive bounds on an integer.
#[derive(Clone, Copy, Debug, Default)]
pub struct RangeValidator {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl RangeValidator {
    pub fn between(min: i64, max: i64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }
}

impl FieldValidator for RangeValidator {
    fn validate(&self, value: &FieldValue) -> bool {
        let Some(n) = value.as_i64() else {
            return false;
        };
        self.min.map_or(true, |min| n >= min) && self.max.map_or(true, |max| n <= max)
    }
}

/// Value must equal one of the listed values.
pub struct OneOf(pub Vec<FieldValue>);

impl OneOf {
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        OneOf(values.into_iter().map(Into::into).collect())
    }
}

impl FieldValidator for OneOf {
    fn validate(&self, value: &FieldValue) -> bool {
        self.0.iter().any(|allowed| allowed == value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Email,
    Uuid,
}

impl FieldValidator for Format {
    fn validate(&self, value: &FieldValue) -> bool {
        let Some(s) = value.as_str() else {
            return false;
        };
        match self {
            Format::Email => s.len() >= 3 && s.contains('@'),
            Format::Uuid => uuid::Uuid::parse_str(s).is_ok(),
        }
    }
}
