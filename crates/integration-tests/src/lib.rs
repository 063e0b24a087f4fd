//! Integration tests for the Handicraft catalog.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p handicraft-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `listing_composition` - filter composition, paging, and sorting
//! - `admin_editing` - product edits, bulk updates, and the admin table
//! - `display_settings` - stored preferences feeding listings
//!
//! Every test runs against [`MemoryCatalogStore`], so no database or network
//! service is needed.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

use handicraft_core::{ProductId, ProductRecord};
use handicraft_storefront::MemoryCatalogStore;

/// Number of products in [`sample_catalog`].
pub const SAMPLE_SIZE: i64 = 15;

/// Ids of the three Brass products in [`sample_catalog`].
pub const BRASS_IDS: [i64; 3] = [3, 8, 13];

/// A deterministic 15-product catalog.
///
/// | property      | rule                                           |
/// |---------------|------------------------------------------------|
/// | price         | `id * 250`                                     |
/// | category      | odd ids are "Idols", even ids are "Decor"      |
/// | material      | 3, 8, 13 are Brass; others Wood/Marble/Copper  |
/// | weight        | cycles "1kg", "2kg", "3kg" starting at id 1    |
/// | hidden        | multiples of 5                                 |
/// | featured      | multiples of 4                                 |
/// | bestseller    | multiples of 3                                 |
/// | created       | `id` days after the epoch                      |
#[must_use]
pub fn sample_catalog() -> Vec<ProductRecord> {
    (1..=SAMPLE_SIZE).map(sample_product).collect()
}

/// [`sample_catalog`] behind an in-memory store.
#[must_use]
pub fn sample_store() -> MemoryCatalogStore {
    MemoryCatalogStore::new(sample_catalog())
}

/// [`sample_catalog`] with the three Brass products filed under a "Brass"
/// category instead of their usual one.
#[must_use]
pub fn brass_category_store() -> MemoryCatalogStore {
    let records = sample_catalog()
        .into_iter()
        .map(|mut record| {
            if BRASS_IDS.contains(&record.id.as_i64()) {
                record.category = "Brass".to_string();
            }
            record
        })
        .collect();
    MemoryCatalogStore::new(records)
}

/// Product `id` of [`sample_catalog`].
#[must_use]
pub fn sample_product(id: i64) -> ProductRecord {
    let material = if BRASS_IDS.contains(&id) {
        "Brass"
    } else {
        match id % 3 {
            0 => "Wood",
            1 => "Marble",
            _ => "Copper",
        }
    };
    let category = if id % 2 == 1 { "Idols" } else { "Decor" };

    let mut record = ProductRecord::new(
        ProductId::new(id),
        format!("Item {id}"),
        Decimal::new(id * 250, 0),
        category,
        material,
    );
    record.description = Some("Handcrafted by village artisans".to_string());
    record.weight = Some(format!("{}kg", (id - 1) % 3 + 1));
    record.sku = Some(format!("HC-{id:03}"));
    record.stock_quantity = u32::try_from(id).unwrap_or_default();
    record.tags = vec!["handmade".to_string()];
    record.related_gods = if id % 2 == 1 {
        vec!["Ganesha".to_string()]
    } else if id % 4 == 0 {
        vec!["Lakshmi".to_string()]
    } else {
        Vec::new()
    };
    record.occasions = if id % 3 == 0 {
        vec!["Diwali".to_string()]
    } else {
        Vec::new()
    };
    record.is_visible = id % 5 != 0;
    record.is_featured = id % 4 == 0;
    record.is_bestseller = id % 3 == 0;
    record.created_at = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::days(id);
    record
}

/// A minimal product carrying only a free-text weight.
#[must_use]
pub fn weighted_product(id: i64, weight: &str) -> ProductRecord {
    let mut record = ProductRecord::new(
        ProductId::new(id),
        format!("Piece {id}"),
        Decimal::new(1000, 0),
        "Idols",
        "Stone",
    );
    record.weight = Some(weight.to_string());
    record
}

/// Raw ids of `records`, in order.
#[must_use]
pub fn ids(records: &[ProductRecord]) -> Vec<i64> {
    records.iter().map(|r| r.id.as_i64()).collect()
}
