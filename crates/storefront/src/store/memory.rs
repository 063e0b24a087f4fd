//! In-process catalog store.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::instrument;

use handicraft_core::{ProductId, ProductRecord};

use super::CatalogStore;
use crate::admin::{BulkUpdate, ProductUpdate};
use crate::error::StoreError;
use crate::query::{ProductQuery, QueryPage, eval};

/// A catalog held in memory, evaluated with the shared predicate evaluator.
///
/// Clones share the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    records: Arc<RwLock<Vec<ProductRecord>>>,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new(records: Vec<ProductRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Load records from a JSON array, as exported by the hosted service.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Parse` if the document is not an array of
    /// product rows.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<ProductRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<ProductRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CatalogStore for MemoryCatalogStore {
    #[instrument(skip(self, query), fields(predicates = query.predicates.len()))]
    async fn query(&self, query: &ProductQuery) -> Result<QueryPage, StoreError> {
        let (items, total_count) = eval::execute(&self.read(), query);
        Ok(QueryPage { items, total_count })
    }

    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let mut records = self.read().clone();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn fetch_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        Ok(self.read().iter().find(|r| r.id == id).cloned())
    }

    #[instrument(skip(self, update))]
    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<ProductRecord, StoreError> {
        let mut records = self.write();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        update.apply_to(record);
        Ok(record.clone())
    }

    #[instrument(skip(self, ids, update), fields(ids = ids.len()))]
    async fn bulk_update(&self, ids: &[ProductId], update: &BulkUpdate) -> Result<u64, StoreError> {
        let mut records = self.write();
        let mut changed = 0;
        for record in records.iter_mut().filter(|r| ids.contains(&r.id)) {
            update.apply_to(record);
            changed += 1;
        }
        Ok(changed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::query::{Column, Ordering, Predicate, Value};

    fn catalog() -> MemoryCatalogStore {
        MemoryCatalogStore::new(
            [3, 1, 2]
                .into_iter()
                .map(|id| {
                    ProductRecord::new(
                        ProductId::new(id),
                        format!("Item {id}"),
                        Decimal::new(id * 10, 0),
                        "Lamps",
                        "Brass",
                    )
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_fetch_all_ordered_by_id() {
        let ids: Vec<i64> = catalog()
            .fetch_all()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id.as_i64())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_query_counts_before_paging() {
        let query = ProductQuery {
            predicates: vec![Predicate::gte(Column::Price, Value::Decimal(Decimal::new(20, 0)))],
            orderings: vec![Ordering::desc(Column::Price)],
            offset: 0,
            limit: 1,
        };
        let page = catalog().query(&query).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, ProductId::new(3));
    }

    #[tokio::test]
    async fn test_fetch_by_id_absent() {
        assert!(catalog().fetch_by_id(ProductId::new(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bulk_update_counts_existing_rows() {
        let store = catalog();
        let update = BulkUpdate {
            is_new_arrival: Some(true),
            ..BulkUpdate::default()
        };
        let changed = store
            .bulk_update(&[ProductId::new(1), ProductId::new(42)], &update)
            .await
            .unwrap();
        assert_eq!(changed, 1);
        let record = store.fetch_by_id(ProductId::new(1)).await.unwrap().unwrap();
        assert!(record.is_new_arrival);
    }

    #[test]
    fn test_from_json_tolerates_nulls() {
        let store = MemoryCatalogStore::from_json(
            r#"[{"id": 5, "name": "Bell", "price": "120", "category": "Pooja",
                "material": "Bronze", "tags": null, "is_visible": null,
                "created_at": "2024-03-01T00:00:00Z"}]"#,
        )
        .unwrap();
        assert_eq!(store.len(), 1);
    }
}
