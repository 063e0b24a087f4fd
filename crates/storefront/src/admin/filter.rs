//! Admin product list filtering.
//!
//! Runs over the full catalog in memory; the admin table shows every product
//! regardless of storefront visibility unless asked otherwise.

use std::collections::BTreeSet;

use handicraft_core::{ProductRecord, VisibilityMode};

use super::Selection;
use crate::query::eval::contains_ignore_case;

/// Filters applied to the admin product table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminProductFilter {
    /// Matched against name, sku, category, material, artisan, region, tags,
    /// price, and stock count.
    pub search: Option<String>,
    /// Case-insensitive substring of the category.
    pub category: Option<String>,
    pub visibility: VisibilityMode,
    /// Show only products in the current selection.
    pub selected_only: bool,
}

impl AdminProductFilter {
    /// Whether `record` passes every active filter.
    #[must_use]
    pub fn matches(&self, record: &ProductRecord, selection: &Selection) -> bool {
        if self.selected_only && !selection.contains(record.id) {
            return false;
        }
        if !self.visibility.admits(record.is_visible) {
            return false;
        }
        if let Some(category) = non_blank(self.category.as_deref())
            && !contains_ignore_case(&record.category, category)
        {
            return false;
        }
        match non_blank(self.search.as_deref()) {
            Some(term) => admin_search_fields(record)
                .iter()
                .any(|field| contains_ignore_case(field, term)),
            None => true,
        }
    }

    /// The records that pass, in their original order.
    #[must_use]
    pub fn apply<'a>(
        &self,
        records: &'a [ProductRecord],
        selection: &Selection,
    ) -> Vec<&'a ProductRecord> {
        records
            .iter()
            .filter(|record| self.matches(record, selection))
            .collect()
    }
}

/// Sorted distinct non-empty categories, for the category dropdown.
#[must_use]
pub fn unique_categories(records: &[ProductRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.category.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn admin_search_fields(record: &ProductRecord) -> Vec<String> {
    let mut fields = vec![
        record.name.clone(),
        record.category.clone(),
        record.material.clone(),
        record.price.to_string(),
        record.stock_quantity.to_string(),
    ];
    fields.extend(
        [&record.sku, &record.artisan, &record.region_of_origin]
            .into_iter()
            .flatten()
            .cloned(),
    );
    fields.extend(record.tags.iter().cloned());
    fields
}
