//! Core types for the Handicraft catalog.
//!
//! This module provides type-safe wrappers for the catalog domain.

pub mod criteria;
pub mod id;
pub mod options;
pub mod price;
pub mod product;
pub mod settings;
pub mod weight;

pub use criteria::{
    FilterCriteria, NumericRange, PageRequest, PriceRange, Range, RawFilterInput, RawRange,
    SortKey, VisibilityMode, DEFAULT_PAGE_SIZE,
};
pub use id::*;
pub use options::{DEFAULT_MAX_PRICE, FilterOptions};
pub use price::{discount_percentage, format_inr};
pub use product::{LOW_STOCK_THRESHOLD, ProductRecord, StockStatus, UNCATEGORIZED, group_by_category};
pub use settings::{DisplayPreset, DisplaySettings, UnknownPreset};
pub use weight::parse_weight_kg;
