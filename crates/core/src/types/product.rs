//! Catalog product record.
//!
//! A [`ProductRecord`] mirrors one row of the hosted `products` table. The
//! hosted service returns `null` for unset arrays and flags, so those fields
//! deserialize `null` into their defaults rather than failing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::ProductId;
use super::price::{discount_percentage, format_inr};
use super::weight::parse_weight_kg;

/// Stock level below which the storefront shows an "only N left" warning.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Category label used when a record has an empty category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// One catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub discounted_price: Option<Decimal>,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub material: String,
    #[serde(default)]
    pub region_of_origin: Option<String>,
    #[serde(default)]
    pub artisan: Option<String>,
    /// Free-text dimensions as entered by staff (e.g. `"12 x 8 x 4 in"`).
    #[serde(default)]
    pub dimensions: Option<String>,
    /// Free-text weight, possibly with a unit (`"2kg"`, `"500g"`, `"1.5"`).
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub related_gods: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub occasions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub width_in: Option<f64>,
    #[serde(default)]
    pub height_in: Option<f64>,
    #[serde(default)]
    pub depth_in: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_bestseller: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_new_arrival: bool,
    #[serde(default = "default_visible", deserialize_with = "null_as_visible")]
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

const fn default_visible() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_visible<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// Stock availability as shown next to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    OutOfStock,
    /// Fewer than [`LOW_STOCK_THRESHOLD`] units remain.
    Low(u32),
    InStock,
}

impl StockStatus {
    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::OutOfStock => "Out of stock".to_string(),
            Self::Low(remaining) => format!("Only {remaining} left"),
            Self::InStock => "In stock".to_string(),
        }
    }
}

impl ProductRecord {
    /// Create a record with the required fields set and everything else empty.
    ///
    /// New records are visible, have no stock, and carry the Unix epoch as
    /// their creation time until the store assigns one.
    #[must_use]
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Decimal,
        category: impl Into<String>,
        material: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            price,
            discounted_price: None,
            category: category.into(),
            subcategory: None,
            material: material.into(),
            region_of_origin: None,
            artisan: None,
            dimensions: None,
            weight: None,
            sku: None,
            stock_quantity: 0,
            tags: Vec::new(),
            related_gods: Vec::new(),
            occasions: Vec::new(),
            image_urls: Vec::new(),
            width_in: None,
            height_in: None,
            depth_in: None,
            is_featured: false,
            is_bestseller: false,
            is_new_arrival: false,
            is_visible: true,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// The discounted price, when one is set and positive.
    #[must_use]
    pub fn active_discount(&self) -> Option<Decimal> {
        self.discounted_price.filter(|d| *d > Decimal::ZERO)
    }

    /// The price a customer pays: the discounted price when one is set.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.active_discount().unwrap_or(self.price)
    }

    /// Effective price formatted for display.
    #[must_use]
    pub fn display_price(&self) -> String {
        format_inr(self.effective_price())
    }

    /// Whole-number percentage saved, or 0 without a discount.
    #[must_use]
    pub fn discount_percentage(&self) -> u32 {
        self.active_discount()
            .map_or(0, |discounted| discount_percentage(self.price, discounted))
    }

    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    #[must_use]
    pub const fn stock_status(&self) -> StockStatus {
        match self.stock_quantity {
            0 => StockStatus::OutOfStock,
            n if n < LOW_STOCK_THRESHOLD => StockStatus::Low(n),
            _ => StockStatus::InStock,
        }
    }

    /// Weight normalized to kilograms, when the free-text weight parses.
    #[must_use]
    pub fn weight_kg(&self) -> Option<f64> {
        self.weight.as_deref().and_then(parse_weight_kg)
    }

    /// Category, material, and related gods joined for a compact tag line.
    #[must_use]
    pub fn tags_label(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.category.is_empty() {
            parts.push(&self.category);
        }
        if !self.material.is_empty() {
            parts.push(&self.material);
        }
        parts.extend(self.related_gods.iter().map(String::as_str));
        parts.join(", ")
    }

    /// Every descriptive field lowercased and joined by spaces.
    #[must_use]
    pub fn searchable_content(&self) -> String {
        let fields = [
            Some(self.name.as_str()),
            self.description.as_deref(),
            Some(self.category.as_str()),
            self.subcategory.as_deref(),
            Some(self.material.as_str()),
            self.region_of_origin.as_deref(),
            self.artisan.as_deref(),
        ];

        fields
            .into_iter()
            .flatten()
            .chain(self.related_gods.iter().map(String::as_str))
            .chain(self.occasions.iter().map(String::as_str))
            .chain(self.tags.iter().map(String::as_str))
            .filter(|field| !field.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Compact `H" × W" × D" in` label from the numeric dimension columns.
    ///
    /// Missing or non-positive dimensions are skipped. Falls back to the
    /// free-text `dimensions` field when no numeric dimension is set.
    #[must_use]
    pub fn dimensions_label(&self) -> Option<String> {
        let parts: Vec<String> = [self.height_in, self.width_in, self.depth_in]
            .into_iter()
            .flatten()
            .filter(|value| *value > 0.0)
            .map(|value| format!("{value}\""))
            .collect();

        if parts.is_empty() {
            return self.dimensions.clone().filter(|d| !d.trim().is_empty());
        }
        Some(format!("{} in", parts.join(" × ")))
    }
}

/// Group records by category, using [`UNCATEGORIZED`] for empty categories.
#[must_use]
pub fn group_by_category(products: &[ProductRecord]) -> BTreeMap<String, Vec<ProductRecord>> {
    let mut groups: BTreeMap<String, Vec<ProductRecord>> = BTreeMap::new();
    for product in products {
        let category = if product.category.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            product.category.clone()
        };
        groups.entry(category).or_default().push(product.clone());
    }
    groups
}
