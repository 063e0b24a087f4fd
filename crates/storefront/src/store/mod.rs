//! Catalog store backends.
//!
//! # Architecture
//!
//! - [`CatalogStore`] is the capability every backend provides: a
//!   descriptor query with exact count, a bulk read, a primary-key read, and
//!   the two admin writes
//! - [`RestCatalogStore`] talks to a PostgREST-compatible hosted service and
//!   caches bulk reads with `moka`
//! - [`PgCatalogStore`] renders descriptors as parameterized SQL
//! - [`MemoryCatalogStore`] evaluates descriptors in process
//! - [`AnyCatalogStore`] picks one of the remote backends from configuration

pub mod memory;
pub mod postgres;
pub mod rest;

use std::future::Future;

use handicraft_core::{ProductId, ProductRecord};

use crate::admin::{BulkUpdate, ProductUpdate};
use crate::config::{CatalogConfig, StoreBackend};
use crate::error::StoreError;
use crate::query::{ProductQuery, QueryPage};

pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;
pub use rest::RestCatalogStore;

/// Read and write access to the products table.
pub trait CatalogStore: Send + Sync {
    /// Evaluate a descriptor, returning one page and the exact match count.
    fn query(
        &self,
        query: &ProductQuery,
    ) -> impl Future<Output = Result<QueryPage, StoreError>> + Send;

    /// Every product, ordered by id.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<ProductRecord>, StoreError>> + Send;

    /// A single product, or `None` when the id is unknown.
    fn fetch_by_id(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<ProductRecord>, StoreError>> + Send;

    /// Overwrite the editable fields of one product and return the stored row.
    fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> impl Future<Output = Result<ProductRecord, StoreError>> + Send;

    /// Write the selected fields to every listed product, returning how many
    /// rows changed.
    fn bulk_update(
        &self,
        ids: &[ProductId],
        update: &BulkUpdate,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// A remote store chosen at runtime from [`CatalogConfig`].
#[derive(Debug, Clone)]
pub enum AnyCatalogStore {
    Rest(RestCatalogStore),
    Postgres(PgCatalogStore),
}

impl AnyCatalogStore {
    /// Connect to the backend named by the configured URL.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the `PostgreSQL` pool cannot be
    /// created and `StoreError::InvalidConfig` for an unusable REST URL.
    pub async fn connect(config: &CatalogConfig) -> Result<Self, StoreError> {
        match config.backend {
            StoreBackend::Rest => Ok(Self::Rest(RestCatalogStore::new(config)?)),
            StoreBackend::Postgres => Ok(Self::Postgres(PgCatalogStore::connect(config).await?)),
        }
    }
}

impl CatalogStore for AnyCatalogStore {
    async fn query(&self, query: &ProductQuery) -> Result<QueryPage, StoreError> {
        match self {
            Self::Rest(store) => store.query(query).await,
            Self::Postgres(store) => store.query(query).await,
        }
    }

    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
        match self {
            Self::Rest(store) => store.fetch_all().await,
            Self::Postgres(store) => store.fetch_all().await,
        }
    }

    async fn fetch_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        match self {
            Self::Rest(store) => store.fetch_by_id(id).await,
            Self::Postgres(store) => store.fetch_by_id(id).await,
        }
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<ProductRecord, StoreError> {
        match self {
            Self::Rest(store) => store.update_product(id, update).await,
            Self::Postgres(store) => store.update_product(id, update).await,
        }
    }

    async fn bulk_update(&self, ids: &[ProductId], update: &BulkUpdate) -> Result<u64, StoreError> {
        match self {
            Self::Rest(store) => store.bulk_update(ids, update).await,
            Self::Postgres(store) => store.bulk_update(ids, update).await,
        }
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
///
/// Both remote backends hand patterns to `ILIKE`, whose default escape
/// character is a backslash.
pub(crate) fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
