//! PostgreSQL session over a sqlx pool.

use crate::config::{ColumnInfo, StorageTable};
use crate::error::EntError;
use crate::field::{FieldKind, FieldValue};
use crate::sql::{self, QueryBuf};
use crate::store::{Record, SelectQuery, Session};
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Schema holding entity tables, from `ENT_SCHEMA`. Unset means the search path.
pub fn ent_schema() -> Option<String> {
    std::env::var("ENT_SCHEMA")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Clone, Debug)]
pub struct PgSession {
    pool: PgPool,
    schema: Option<String>,
}

impl PgSession {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, schema: ent_schema() }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<PgRow>, EntError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, EntError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.execute(&self.pool).await?.rows_affected())
    }
}

#[async_trait]
impl Session for PgSession {
    async fn fetch_by_id(&self, table: &StorageTable, id: Uuid) -> Result<Option<Record>, EntError> {
        let q = sql::select_by_id(table, id, self.schema());
        let rows = self.fetch_all(&q).await?;
        rows.first().map(|row| row_to_record(row, &table.columns)).transpose()
    }

    async fn insert(&self, table: &StorageTable, record: &Record) -> Result<(), EntError> {
        let q = sql::insert(table, record, self.schema());
        self.execute(&q).await?;
        Ok(())
    }

    async fn update(&self, table: &StorageTable, id: Uuid, changes: &Record) -> Result<(), EntError> {
        if let Some(q) = sql::update(table, id, changes, self.schema()) {
            self.execute(&q).await?;
        }
        Ok(())
    }

    async fn delete(&self, table: &StorageTable, id: Uuid) -> Result<(), EntError> {
        let q = sql::delete(table, id, self.schema());
        self.execute(&q).await?;
        Ok(())
    }

    async fn select(&self, query: &SelectQuery) -> Result<Vec<Record>, EntError> {
        let q = sql::select(query, self.schema());
        let rows = self.fetch_all(&q).await?;
        rows.iter()
            .map(|row| row_to_record(row, &query.source.columns))
            .collect()
    }

    async fn count(&self, query: &SelectQuery) -> Result<Option<i64>, EntError> {
        let q = sql::count(query, self.schema());
        let rows = self.fetch_all(&q).await?;
        match rows.first() {
            Some(row) => Ok(row.try_get::<Option<i64>, _>(0)?),
            None => Ok(None),
        }
    }
}

fn row_to_record(row: &PgRow, columns: &[ColumnInfo]) -> Result<Record, EntError> {
    columns
        .iter()
        .map(|c| Ok((c.name.clone(), cell_to_value(row, c)?)))
        .collect()
}

fn cell_to_value(row: &PgRow, column: &ColumnInfo) -> Result<FieldValue, EntError> {
    let name = column.name.as_str();
    let value = match &column.kind {
        FieldKind::Bool => row.try_get::<Option<bool>, _>(name)?.into(),
        FieldKind::Int => row.try_get::<Option<i64>, _>(name)?.into(),
        FieldKind::String { .. } | FieldKind::Text => row.try_get::<Option<String>, _>(name)?.into(),
        FieldKind::Enum(_) => row
            .try_get::<Option<String>, _>(name)?
            .map_or(FieldValue::Null, FieldValue::Enum),
        FieldKind::Datetime => row.try_get::<Option<DateTime<Utc>>, _>(name)?.into(),
        FieldKind::Time => row.try_get::<Option<NaiveTime>, _>(name)?.into(),
        FieldKind::Uuid | FieldKind::Edge(_) => row.try_get::<Option<Uuid>, _>(name)?.into(),
        FieldKind::Json { .. } => row
            .try_get::<Option<serde_json::Value>, _>(name)?
            .map_or(FieldValue::Null, FieldValue::Json),
    };
    Ok(value)
}
