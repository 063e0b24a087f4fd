//! Catalog administration.
//!
//! - [`edit`] - single-product drafts and validation
//! - [`bulk`] - multi-product updates and selection
//! - [`filter`] - admin table filtering
//!
//! [`CatalogAdmin`] ties them to a [`CatalogStore`]: it validates, writes,
//! and reports the outcome through a [`Notifier`].

pub mod bulk;
pub mod edit;
pub mod filter;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument};

use handicraft_core::{ProductId, ProductRecord};

use crate::error::{AppError, add_breadcrumb};
use crate::notify::{Notifier, Toast};
use crate::store::CatalogStore;

pub use bulk::{BulkUpdate, Selection};
pub use edit::{ProductDraft, ProductUpdate};
pub use filter::{AdminProductFilter, unique_categories};

/// Shown when a draft is missing a required field.
pub const REQUIRED_FIELDS_MISSING: &str = "Please fill in all required fields.";
/// Shown when a single-product write fails.
pub const PRODUCT_UPDATE_FAILED: &str = "Failed to update product. Please try again.";
/// Shown when a bulk update has no products selected.
pub const NO_PRODUCTS_SELECTED: &str = "Please select at least one product to update.";
/// Shown when a bulk update has no fields selected.
pub const NO_FIELDS_SELECTED: &str = "Please select at least one field to update.";
/// Shown when a bulk write fails.
pub const BULK_UPDATE_FAILED: &str = "Failed to update products. Please try again.";

/// An edit rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Discounted price {discounted_price} must be below price {price}")]
    DiscountNotBelowPrice {
        price: Decimal,
        discounted_price: Decimal,
    },

    #[error("Product {id}: discounted price {discounted_price} must be below price {price}")]
    BulkDiscountNotBelowPrice {
        id: ProductId,
        price: Decimal,
        discounted_price: Decimal,
    },

    #[error("Price must be positive, got {0}")]
    InvalidPrice(Decimal),

    #[error("Discounted price must not be negative, got {0}")]
    NegativeDiscount(Decimal),

    #[error("No products selected")]
    NoProductsSelected,

    #[error("No fields selected")]
    NoFieldsSelected,
}

impl ValidationError {
    /// The notification text for this rejection.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingField(_) => REQUIRED_FIELDS_MISSING.to_string(),
            Self::NoProductsSelected => NO_PRODUCTS_SELECTED.to_string(),
            Self::NoFieldsSelected => NO_FIELDS_SELECTED.to_string(),
            other => other.to_string(),
        }
    }
}

/// Validated writes against a catalog store.
#[derive(Debug, Clone)]
pub struct CatalogAdmin<S, N> {
    store: S,
    notifier: N,
}

impl<S: CatalogStore, N: Notifier> CatalogAdmin<S, N> {
    #[must_use]
    pub const fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Validate and save one product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a rejected draft and
    /// `AppError::Store` when the write fails. Either way a destructive
    /// notification has already been emitted.
    #[instrument(skip(self, draft))]
    pub async fn save_product(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<ProductRecord, AppError> {
        let update = match draft.validate() {
            Ok(update) => update,
            Err(e) => {
                self.notifier.notify(Toast::error(e.user_message()));
                return Err(e.into());
            }
        };

        match self.store.update_product(id, &update).await {
            Ok(record) => {
                info!(product_id = %id, "Product updated");
                add_breadcrumb("admin", "Product updated", Some(&[("id", &id.to_string())]));
                self.notifier
                    .notify(Toast::success("Success", "Product updated successfully!"));
                Ok(record)
            }
            Err(e) => {
                let err = AppError::from(e);
                err.report("save_product");
                self.notifier.notify(Toast::error(PRODUCT_UPDATE_FAILED));
                Err(err)
            }
        }
    }

    /// Validate and apply a bulk update to the selected products.
    ///
    /// `records` must contain the current state of every selected product;
    /// ids missing from it are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when nothing is selected or a resulting
    /// discount would not be below its price, and `AppError::Store` when the
    /// write fails.
    #[instrument(skip(self, selection, records, update), fields(selected = selection.len()))]
    pub async fn apply_bulk(
        &self,
        selection: &Selection,
        records: &[ProductRecord],
        update: &BulkUpdate,
    ) -> Result<u64, AppError> {
        let affected: Vec<ProductRecord> = records
            .iter()
            .filter(|r| selection.contains(r.id))
            .cloned()
            .collect();

        if let Err(e) = update.validate_against(&affected) {
            self.notifier.notify(Toast::error(e.user_message()));
            return Err(e.into());
        }

        let ids: Vec<ProductId> = affected.iter().map(|r| r.id).collect();
        match self.store.bulk_update(&ids, update).await {
            Ok(count) => {
                info!(count, fields = ?update.field_names(), "Bulk update applied");
                self.notifier.notify(Toast::success(
                    "Success",
                    format!("Updated {count} products successfully!"),
                ));
                Ok(count)
            }
            Err(e) => {
                let err = AppError::from(e);
                err.report("apply_bulk");
                self.notifier.notify(Toast::error(BULK_UPDATE_FAILED));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notify::{RecordingNotifier, ToastVariant};
    use crate::store::MemoryCatalogStore;

    fn record(id: i64, price: i64) -> ProductRecord {
        let mut record = ProductRecord::new(
            ProductId::new(id),
            format!("Item {id}"),
            Decimal::new(price, 0),
            "Lamps",
            "Brass",
        );
        record.description = Some("Hand made".to_string());
        record
    }

    fn admin() -> (CatalogAdmin<MemoryCatalogStore, RecordingNotifier>, RecordingNotifier) {
        let notifier = RecordingNotifier::new();
        let store = MemoryCatalogStore::new(vec![record(1, 1000), record(2, 500)]);
        (CatalogAdmin::new(store, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn test_save_product_success() {
        let (admin, notifier) = admin();
        let current = admin.store().fetch_by_id(ProductId::new(1)).await.unwrap().unwrap();
        let mut draft = ProductDraft::from_record(&current);
        draft.stock_quantity = Some(2);

        let saved = admin.save_product(ProductId::new(1), draft).await.unwrap();
        assert_eq!(saved.stock_quantity, 2);
        let toasts = notifier.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].description, "Product updated successfully!");
    }

    #[tokio::test]
    async fn test_save_product_missing_field() {
        let (admin, notifier) = admin();
        let result = admin
            .save_product(ProductId::new(1), ProductDraft::default())
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(notifier.toasts()[0].description, REQUIRED_FIELDS_MISSING);
    }

    #[tokio::test]
    async fn test_save_unknown_product_fails() {
        let (admin, notifier) = admin();
        let draft = ProductDraft::from_record(&record(99, 10));
        let result = admin.save_product(ProductId::new(99), draft).await;
        assert!(matches!(result, Err(AppError::Store(_))));
        assert_eq!(notifier.toasts()[0].description, PRODUCT_UPDATE_FAILED);
        assert_eq!(notifier.toasts()[0].variant, ToastVariant::Destructive);
    }

    #[tokio::test]
    async fn test_apply_bulk() {
        let (admin, notifier) = admin();
        let records = admin.store().fetch_all().await.unwrap();
        let mut selection = Selection::new();
        selection.select_all(&records);

        let update = BulkUpdate {
            is_featured: Some(true),
            ..BulkUpdate::default()
        };
        let count = admin.apply_bulk(&selection, &records, &update).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            notifier.toasts()[0].description,
            "Updated 2 products successfully!"
        );
        let all = admin.store().fetch_all().await.unwrap();
        assert!(all.iter().all(|r| r.is_featured));
    }

    #[tokio::test]
    async fn test_apply_bulk_requires_selection() {
        let (admin, notifier) = admin();
        let records = admin.store().fetch_all().await.unwrap();
        let update = BulkUpdate {
            is_visible: Some(false),
            ..BulkUpdate::default()
        };
        let result = admin.apply_bulk(&Selection::new(), &records, &update).await;
        assert!(result.is_err());
        assert_eq!(notifier.toasts()[0].description, NO_PRODUCTS_SELECTED);
    }
}
