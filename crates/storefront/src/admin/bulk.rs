//! Bulk edits across many products.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use handicraft_core::{ProductId, ProductRecord};

use super::ValidationError;
use super::edit::check_discount;

/// Fields written to every selected product. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Zero clears the discount.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_discount"
    )]
    pub discounted_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bestseller: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_arrival: Option<bool>,
}

impl BulkUpdate {
    /// Whether no field is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.discounted_price.is_none()
            && self.stock_quantity.is_none()
            && self.is_visible.is_none()
            && self.is_featured.is_none()
            && self.is_bestseller.is_none()
            && self.is_new_arrival.is_none()
    }

    /// Names of the selected fields, in column order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        [
            ("price", self.price.is_some()),
            ("discounted_price", self.discounted_price.is_some()),
            ("stock_quantity", self.stock_quantity.is_some()),
            ("is_visible", self.is_visible.is_some()),
            ("is_featured", self.is_featured.is_some()),
            ("is_bestseller", self.is_bestseller.is_some()),
            ("is_new_arrival", self.is_new_arrival.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    /// Check the update against the products it will touch.
    ///
    /// Each record's resulting price and discount must still satisfy the
    /// discount rule.
    ///
    /// # Errors
    ///
    /// - `ValidationError::NoProductsSelected` when `records` is empty
    /// - `ValidationError::NoFieldsSelected` when no field is set
    /// - `ValidationError::InvalidPrice` for a zero or negative price
    /// - `ValidationError::NegativeDiscount` for a discount below zero
    /// - `ValidationError::DiscountNotBelowPrice` naming the first offending
    ///   record
    pub fn validate_against(&self, records: &[ProductRecord]) -> Result<(), ValidationError> {
        if records.is_empty() {
            return Err(ValidationError::NoProductsSelected);
        }
        if self.is_empty() {
            return Err(ValidationError::NoFieldsSelected);
        }
        if let Some(price) = self.price
            && price <= Decimal::ZERO
        {
            return Err(ValidationError::InvalidPrice(price));
        }
        if let Some(discounted) = self.discounted_price
            && discounted < Decimal::ZERO
        {
            return Err(ValidationError::NegativeDiscount(discounted));
        }

        for record in records {
            let price = self.price.unwrap_or(record.price);
            let discounted = self
                .discounted_price
                .map_or(record.discounted_price, stored_discount);
            if let Some(discounted) = discounted.filter(|d| *d > Decimal::ZERO) {
                check_discount(price, discounted).map_err(|_| {
                    ValidationError::BulkDiscountNotBelowPrice {
                        id: record.id,
                        price,
                        discounted_price: discounted,
                    }
                })?;
            }
        }
        Ok(())
    }

    /// Copy the selected fields onto `record`.
    pub fn apply_to(&self, record: &mut ProductRecord) {
        if let Some(price) = self.price {
            record.price = price;
        }
        if let Some(discounted) = self.discounted_price {
            record.discounted_price = stored_discount(discounted);
        }
        if let Some(stock) = self.stock_quantity {
            record.stock_quantity = stock;
        }
        if let Some(visible) = self.is_visible {
            record.is_visible = visible;
        }
        if let Some(featured) = self.is_featured {
            record.is_featured = featured;
        }
        if let Some(bestseller) = self.is_bestseller {
            record.is_bestseller = bestseller;
        }
        if let Some(new_arrival) = self.is_new_arrival {
            record.is_new_arrival = new_arrival;
        }
    }
}

/// The discount column value for a selected discount; zero clears it.
#[must_use]
pub(crate) fn stored_discount(discounted: Decimal) -> Option<Decimal> {
    (discounted > Decimal::ZERO).then_some(discounted)
}

#[allow(clippy::ref_option)]
fn serialize_discount<S: serde::Serializer>(
    value: &Option<Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    value.and_then(stored_discount).serialize(serializer)
}

/// A set of selected product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ProductId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: ProductId, selected: bool) {
        if selected {
            self.ids.insert(id);
        } else {
            self.ids.remove(&id);
        }
    }

    /// Add every listed record to the selection.
    pub fn select_all<'a>(&mut self, records: impl IntoIterator<Item = &'a ProductRecord>) {
        self.ids.extend(records.into_iter().map(|r| r.id));
    }

    /// Remove every listed record from the selection.
    pub fn deselect_all<'a>(&mut self, records: impl IntoIterator<Item = &'a ProductRecord>) {
        for record in records {
            self.ids.remove(&record.id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ProductId> {
        self.ids.iter().copied().collect()
    }
}

impl FromIterator<ProductId> for Selection {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
