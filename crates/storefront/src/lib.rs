//! Handicraft storefront library.
//!
//! Catalog browsing and administration for a handicraft shop whose products
//! live in a hosted `PostgreSQL` table.
//!
//! # Modules
//!
//! - [`query`] - turns filter criteria into result pages, either through a
//!   store-side query or the in-memory weight-aware search
//! - [`store`] - catalog backends (hosted REST service, direct `PostgreSQL`,
//!   in-memory)
//! - [`listing`] - page loaders with stale-result protection
//! - [`admin`] - validated single and bulk product edits
//! - [`settings`] - persisted display preferences
//! - [`debounce`] - search input coalescing
//! - [`notify`] - user-facing notifications
//! - [`config`] / [`error`] - environment configuration and error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod config;
pub mod debounce;
pub mod error;
pub mod listing;
pub mod notify;
pub mod query;
pub mod settings;
pub mod store;

pub use error::{AppError, Result, StoreError};
pub use listing::{ListingState, ProductListing};
pub use query::{FilterQueryComposer, QueryPage};
pub use store::{AnyCatalogStore, CatalogStore, MemoryCatalogStore};
