//! Generate the typed entity layer for the example consumer's descriptors.
//!
//! `cargo run --example generate`; set `ENTGEN_OUTPUT_DIR` (and the other
//! `ENTGEN_*` variables) to override the defaults.

#[path = "../example_consumer/src/schemas.rs"]
mod schemas;
#[path = "../example_consumer/src/vc.rs"]
mod vc;

use ent_sdk::{GeneratorConfig, Registry};
use schemas::{EntOwnedPattern, EntPostSchema, EntUserSchema};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ent_sdk=info")),
        )
        .init();

    let registry = Registry::builder()
        .pattern(EntOwnedPattern)
        .schema(EntUserSchema)
        .schema(EntPostSchema)
        .build()?;
    let config = GeneratorConfig::from_env();
    let written = ent_sdk::run(&registry, &config)?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
