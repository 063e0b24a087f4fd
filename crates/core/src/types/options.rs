//! Facet values offered by the filter sidebar.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::ProductRecord;

/// Upper price bound used when the catalog offers no usable maximum.
pub const DEFAULT_MAX_PRICE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Distinct facet values and the price span of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub gods: Vec<String>,
    pub occasions: Vec<String>,
    pub materials: Vec<String>,
    pub categories: Vec<String>,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            gods: Vec::new(),
            occasions: Vec::new(),
            materials: Vec::new(),
            categories: Vec::new(),
            min_price: Decimal::ZERO,
            max_price: DEFAULT_MAX_PRICE,
        }
    }
}

impl FilterOptions {
    /// Collect sorted, de-duplicated facet values from a set of records.
    ///
    /// An empty catalog, or one whose prices are all zero, reports a price
    /// span of `0..=10000` so the slider stays usable.
    #[must_use]
    pub fn from_records(records: &[ProductRecord]) -> Self {
        let mut gods = BTreeSet::new();
        let mut occasions = BTreeSet::new();
        let mut materials = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut min_price: Option<Decimal> = None;
        let mut max_price: Option<Decimal> = None;

        for record in records {
            gods.extend(record.related_gods.iter().filter(|g| !g.is_empty()).cloned());
            occasions.extend(record.occasions.iter().filter(|o| !o.is_empty()).cloned());
            if !record.material.is_empty() {
                materials.insert(record.material.clone());
            }
            if !record.category.is_empty() {
                categories.insert(record.category.clone());
            }
            min_price = Some(min_price.map_or(record.price, |m| m.min(record.price)));
            max_price = Some(max_price.map_or(record.price, |m| m.max(record.price)));
        }

        Self {
            gods: gods.into_iter().collect(),
            occasions: occasions.into_iter().collect(),
            materials: materials.into_iter().collect(),
            categories: categories.into_iter().collect(),
            min_price: min_price.unwrap_or(Decimal::ZERO),
            max_price: max_price
                .filter(|max| !max.is_zero())
                .unwrap_or(DEFAULT_MAX_PRICE),
        }
    }
}
