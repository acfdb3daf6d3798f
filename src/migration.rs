//! Apply the registry to the database: schema, enum types, tables, indexes,
//! foreign keys, then pattern views. Statements are ordered by PostgreSQL dependencies.

use crate::config::Registry;
use crate::error::EntError;
use crate::sql::ddl::{registry_ddl, DdlStatement};
use crate::sql::quoted;
use crate::store::ent_schema;
use sqlx::PgPool;

/// SQLSTATE duplicate_object.
const DUPLICATE_OBJECT: &str = "42710";

/// Statements `apply_migrations` would run, in order, for the configured schema.
pub fn migration_plan(registry: &Registry) -> Vec<DdlStatement> {
    registry_ddl(registry, ent_schema().as_deref())
}

/// Idempotent for schemas, tables, indexes and views. Enum types and foreign keys have
/// no IF NOT EXISTS form, so their "already exists" failures are ignored.
pub async fn apply_migrations(pool: &PgPool, registry: &Registry) -> Result<(), EntError> {
    let schema = ent_schema();
    if let Some(ref name) = schema {
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(name));
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(&sql).execute(pool).await?;
    }

    let plan = registry_ddl(registry, schema.as_deref());
    let total = plan.len();
    for statement in plan {
        tracing::debug!(sql = %statement.sql, may_exist = statement.may_exist, "migration");
        match sqlx::query(&statement.sql).execute(pool).await {
            Ok(_) => {}
            Err(e) if statement.may_exist && is_duplicate_object(&e) => {
                tracing::debug!(error = %e, "skipped existing object");
            }
            Err(e) => return Err(e.into()),
        }
    }
    tracing::info!(
        schemas = registry.schemas().len(),
        patterns = registry.patterns().len(),
        statements = total,
        "migrations applied"
    );
    Ok(())
}

fn is_duplicate_object(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .map_or(false, |code| code == DUPLICATE_OBJECT)
}
