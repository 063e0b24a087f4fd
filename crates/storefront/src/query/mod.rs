//! Filter composition for product listings.
//!
//! - [`descriptor`] - backend-neutral query descriptor
//! - [`eval`] - in-process evaluation of descriptors
//! - [`comprehensive`] - weight-aware in-memory search
//! - [`composer`] - strategy selection and page composition

pub mod composer;
pub mod comprehensive;
pub mod descriptor;
pub mod eval;

use serde::Serialize;

use handicraft_core::ProductRecord;

pub use composer::{FilterQueryComposer, Strategy, build_query, comprehensive_page};
pub use comprehensive::ComprehensiveSearch;
pub use descriptor::{Column, Direction, Ordering, Predicate, ProductQuery, Value};

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    /// At most one page of records.
    pub items: Vec<ProductRecord>,
    /// Size of the whole matched set, independent of pagination.
    pub total_count: u64,
}
