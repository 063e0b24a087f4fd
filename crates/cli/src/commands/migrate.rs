//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! CATALOG_STORE_URL=postgres://localhost/handicraft handicraft migrate
//! ```
//!
//! Migrations live in `crates/storefront/migrations/`. The hosted REST
//! service manages its own schema, so this command refuses REST URLs.

use handicraft_storefront::StoreError;
use handicraft_storefront::config::{CatalogConfig, StoreBackend};
use handicraft_storefront::store::PgCatalogStore;

/// Run catalog database migrations.
pub async fn run(config: &CatalogConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.backend != StoreBackend::Postgres {
        return Err(StoreError::InvalidConfig(
            "migrations need a postgres:// CATALOG_STORE_URL".to_string(),
        )
        .into());
    }

    tracing::info!("Connecting to catalog database...");
    let store = PgCatalogStore::connect(config).await?;

    tracing::info!("Running catalog migrations...");
    store.migrate().await?;

    tracing::info!("Catalog migrations complete!");
    Ok(())
}
