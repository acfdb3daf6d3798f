//! Example consumer: a separate Rust project that uses ent-sdk as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

mod schemas;
mod vc;

use ent_sdk::{apply_migrations, col, EntError, PgSession, Registry, Vc};
use schemas::{EntOwnedPattern, EntPostSchema, EntUserSchema, PostStatus};
use std::sync::Arc;
use vc::ViewerContext;

fn build_registry() -> Result<Registry, ent_sdk::ConfigError> {
    Registry::builder()
        .pattern(EntOwnedPattern)
        .schema(EntUserSchema)
        .schema(EntPostSchema)
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ent_sdk=info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/ent".into());
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let registry = build_registry()?;
    apply_migrations(&pool, &registry).await?;
    let session = PgSession::new(pool);

    let users = registry.schema("EntUser")?;
    let posts = registry.schema("EntPost")?;
    let anonymous: Vc = Arc::new(ViewerContext::anonymous());
    let author = users.example(&anonymous).save(&session).await?;
    let as_author: Vc = Arc::new(ViewerContext::user(author.id()));

    let draft = posts
        .create(&as_author)
        .set("title", "Draft notes")
        .set("owner", author.id())
        .save(&session)
        .await?;
    tracing::info!(id = %draft.id(), "created draft");

    // Drafts are hidden from everyone but the owner.
    let seen = posts.gen(&session, &anonymous, draft.id()).await?;
    tracing::info!(visible = seen.is_some(), "anonymous read of draft");

    let published = posts
        .update(&as_author, &draft)
        .set("status", PostStatus::Published)
        .save(&session)
        .await?;
    let seen = posts.gen(&session, &anonymous, published.id()).await?;
    tracing::info!(visible = seen.is_some(), "anonymous read after publishing");

    let owned = registry.pattern("EntOwned")?;
    let mut query = owned.query(&anonymous);
    query.where_(col("owner_id").eq(author.id())).order_by_id_desc();
    let count = query.gen_count_no_privacy(&session).await?;
    let visible = query.gen(&session).await?;
    tracing::info!(count, visible = visible.len(), "owned rows");

    match posts.genx(&session, &anonymous, "not-an-id").await {
        Err(EntError::Validation(message)) => tracing::info!(%message, "rejected malformed id"),
        other => tracing::warn!(?other, "unexpected lookup result"),
    }
    Ok(())
}
