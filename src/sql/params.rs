//! Bind values for PostgreSQL. Every value is sent as text and cast in SQL
//! (`$1::timestamptz`, `$2::status`), so one bind type covers all field kinds.

use crate::field::FieldValue;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PgBindValue {
    Null,
    Text(String),
}

impl From<&FieldValue> for PgBindValue {
    fn from(v: &FieldValue) -> Self {
        match v {
            FieldValue::Null => PgBindValue::Null,
            FieldValue::Json(j) => PgBindValue::Text(j.to_string()),
            FieldValue::Time(t) => PgBindValue::Text(t.format("%H:%M:%S%.f").to_string()),
            other => PgBindValue::Text(other.to_string()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            PgBindValue::Null => <Option<&str> as Encode<Postgres>>::encode_by_ref(&None, buf),
            PgBindValue::Text(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf),
        }
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn values_bind_as_text() {
        assert_eq!(PgBindValue::from(&FieldValue::Bool(false)), PgBindValue::Text("false".into()));
        assert_eq!(PgBindValue::from(&FieldValue::Enum("On".into())), PgBindValue::Text("On".into()));
        assert_eq!(
            PgBindValue::from(&FieldValue::Time(NaiveTime::from_hms_milli_opt(1, 2, 3, 400).unwrap())),
            PgBindValue::Text("01:02:03.400".into())
        );
        assert_eq!(PgBindValue::from(&FieldValue::Null), PgBindValue::Null);
    }
}
