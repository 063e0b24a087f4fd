//! Single-product editing.
//!
//! A [`ProductDraft`] holds form input as typed but unvalidated values.
//! [`ProductDraft::validate`] turns it into a [`ProductUpdate`], the complete
//! set of editable columns written back to the store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use handicraft_core::ProductRecord;

use super::ValidationError;

/// Editable product fields as entered in a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub discounted_price: Option<Decimal>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub material: Option<String>,
    pub region_of_origin: Option<String>,
    pub artisan: Option<String>,
    pub dimensions: Option<String>,
    pub weight: Option<String>,
    pub sku: Option<String>,
    pub stock_quantity: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    pub related_gods: Option<Vec<String>>,
    pub occasions: Option<Vec<String>>,
    pub width_in: Option<f64>,
    pub height_in: Option<f64>,
    pub depth_in: Option<f64>,
    pub is_featured: Option<bool>,
    pub is_bestseller: Option<bool>,
    pub is_new_arrival: Option<bool>,
    pub is_visible: Option<bool>,
}

/// Validated column values for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub category: String,
    pub subcategory: Option<String>,
    pub material: String,
    pub region_of_origin: Option<String>,
    pub artisan: Option<String>,
    pub dimensions: Option<String>,
    pub weight: Option<String>,
    pub sku: Option<String>,
    pub stock_quantity: u32,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub related_gods: Vec<String>,
    pub occasions: Vec<String>,
    pub width_in: Option<f64>,
    pub height_in: Option<f64>,
    pub depth_in: Option<f64>,
    pub is_featured: bool,
    pub is_bestseller: bool,
    pub is_new_arrival: bool,
    pub is_visible: bool,
}

impl ProductDraft {
    /// Start editing an existing record.
    #[must_use]
    pub fn from_record(record: &ProductRecord) -> Self {
        Self {
            name: Some(record.name.clone()),
            description: record.description.clone(),
            price: Some(record.price),
            discounted_price: record.discounted_price,
            category: Some(record.category.clone()),
            subcategory: record.subcategory.clone(),
            material: Some(record.material.clone()),
            region_of_origin: record.region_of_origin.clone(),
            artisan: record.artisan.clone(),
            dimensions: record.dimensions.clone(),
            weight: record.weight.clone(),
            sku: record.sku.clone(),
            stock_quantity: Some(record.stock_quantity),
            tags: Some(record.tags.clone()),
            image_urls: Some(record.image_urls.clone()),
            related_gods: Some(record.related_gods.clone()),
            occasions: Some(record.occasions.clone()),
            width_in: record.width_in,
            height_in: record.height_in,
            depth_in: record.depth_in,
            is_featured: Some(record.is_featured),
            is_bestseller: Some(record.is_bestseller),
            is_new_arrival: Some(record.is_new_arrival),
            is_visible: Some(record.is_visible),
        }
    }

    /// Add a tag if it is non-blank and not already present.
    pub fn add_tag(&mut self, tag: &str) {
        push_unique(self.tags.get_or_insert_with(Vec::new), tag);
    }

    pub fn remove_tag(&mut self, tag: &str) {
        if let Some(tags) = &mut self.tags {
            tags.retain(|t| t != tag);
        }
    }

    /// Add an image URL if it is non-blank and not already present.
    pub fn add_image_url(&mut self, url: &str) {
        push_unique(self.image_urls.get_or_insert_with(Vec::new), url);
    }

    pub fn remove_image_url(&mut self, url: &str) {
        if let Some(urls) = &mut self.image_urls {
            urls.retain(|u| u != url);
        }
    }

    /// Check required fields and normalize the rest.
    ///
    /// Blank optional text becomes absent, zero or negative dimensions and
    /// discounts become absent, stock defaults to 0, flags default to false,
    /// and visibility defaults to true.
    ///
    /// # Errors
    ///
    /// - `ValidationError::MissingField` for a blank name, description,
    ///   category, or material, or a missing or zero price
    /// - `ValidationError::DiscountNotBelowPrice` when the discounted price
    ///   is not strictly lower than the price
    pub fn validate(self) -> Result<ProductUpdate, ValidationError> {
        let name = required_text(self.name, "name")?;
        let description = required_text(self.description, "description")?;
        let price = self
            .price
            .filter(|p| *p > Decimal::ZERO)
            .ok_or(ValidationError::MissingField("price"))?;
        let category = required_text(self.category, "category")?;
        let material = required_text(self.material, "material")?;

        let discounted_price = self.discounted_price.filter(|d| *d > Decimal::ZERO);
        if let Some(discounted) = discounted_price {
            check_discount(price, discounted)?;
        }

        Ok(ProductUpdate {
            name,
            description,
            price,
            discounted_price,
            category,
            subcategory: optional_text(self.subcategory),
            material,
            region_of_origin: optional_text(self.region_of_origin),
            artisan: optional_text(self.artisan),
            dimensions: optional_text(self.dimensions),
            weight: optional_text(self.weight),
            sku: optional_text(self.sku),
            stock_quantity: self.stock_quantity.unwrap_or(0),
            tags: clean_list(self.tags),
            image_urls: clean_list(self.image_urls),
            related_gods: clean_list(self.related_gods),
            occasions: clean_list(self.occasions),
            width_in: positive(self.width_in),
            height_in: positive(self.height_in),
            depth_in: positive(self.depth_in),
            is_featured: self.is_featured.unwrap_or(false),
            is_bestseller: self.is_bestseller.unwrap_or(false),
            is_new_arrival: self.is_new_arrival.unwrap_or(false),
            is_visible: self.is_visible.unwrap_or(true),
        })
    }
}

impl ProductUpdate {
    /// Copy every editable column onto `record`.
    pub fn apply_to(&self, record: &mut ProductRecord) {
        record.name.clone_from(&self.name);
        record.description = Some(self.description.clone());
        record.price = self.price;
        record.discounted_price = self.discounted_price;
        record.category.clone_from(&self.category);
        record.subcategory.clone_from(&self.subcategory);
        record.material.clone_from(&self.material);
        record.region_of_origin.clone_from(&self.region_of_origin);
        record.artisan.clone_from(&self.artisan);
        record.dimensions.clone_from(&self.dimensions);
        record.weight.clone_from(&self.weight);
        record.sku.clone_from(&self.sku);
        record.stock_quantity = self.stock_quantity;
        record.tags.clone_from(&self.tags);
        record.image_urls.clone_from(&self.image_urls);
        record.related_gods.clone_from(&self.related_gods);
        record.occasions.clone_from(&self.occasions);
        record.width_in = self.width_in;
        record.height_in = self.height_in;
        record.depth_in = self.depth_in;
        record.is_featured = self.is_featured;
        record.is_bestseller = self.is_bestseller;
        record.is_new_arrival = self.is_new_arrival;
        record.is_visible = self.is_visible;
    }
}

/// A discount must be strictly below the price it discounts.
pub(crate) fn check_discount(price: Decimal, discounted: Decimal) -> Result<(), ValidationError> {
    if discounted < price {
        Ok(())
    } else {
        Err(ValidationError::DiscountNotBelowPrice {
            price,
            discounted_price: discounted,
        })
    }
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    optional_text(value).ok_or(ValidationError::MissingField(field))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn clean_list(values: Option<Vec<String>>) -> Vec<String> {
    let mut cleaned = Vec::new();
    for value in values.unwrap_or_default() {
        push_unique(&mut cleaned, &value);
    }
    cleaned
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
