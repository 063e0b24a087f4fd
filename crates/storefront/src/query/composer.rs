//! Filter criteria to result page.
//!
//! The composer picks one of two strategies for a [`FilterCriteria`]:
//!
//! - **Declarative**: translate every filter into a [`ProductQuery`] and let
//!   the store evaluate, order, and paginate it.
//! - **Comprehensive**: when a search term is the only active filter, fetch
//!   the whole catalog and match it with [`ComprehensiveSearch`], which also
//!   understands weight terms such as "2kg".
//!
//! Sort order and visibility mode are honored identically in both.

use tracing::{debug, instrument, warn};

use handicraft_core::{FilterCriteria, PageRequest, ProductRecord, SortKey, VisibilityMode};

use super::QueryPage;
use super::comprehensive::ComprehensiveSearch;
use super::descriptor::{Column, Ordering, Predicate, ProductQuery, TEXT_SEARCH_COLUMNS, Value};
use super::eval;
use crate::error::StoreError;
use crate::store::CatalogStore;

/// How a listing request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Remote query built from all filters.
    Declarative,
    /// In-memory weight-aware search over the whole catalog.
    Comprehensive,
}

impl Strategy {
    /// Choose the strategy for `criteria`.
    #[must_use]
    pub fn for_criteria(criteria: &FilterCriteria) -> Self {
        if criteria.uses_comprehensive_search() {
            Self::Comprehensive
        } else {
            Self::Declarative
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Declarative => "declarative",
            Self::Comprehensive => "comprehensive",
        }
    }
}

/// Extra filter and ordering implied by a sort key.
///
/// "featured" and "popular" narrow the result to flagged products before
/// ordering by id.
#[must_use]
pub fn sort_clause(sort: Option<SortKey>) -> (Option<Predicate>, Vec<Ordering>) {
    match sort {
        Some(SortKey::Newest) => (None, vec![Ordering::desc(Column::CreatedAt)]),
        Some(SortKey::PriceAsc) => (None, vec![Ordering::asc(Column::Price)]),
        Some(SortKey::PriceDesc) => (None, vec![Ordering::desc(Column::Price)]),
        Some(SortKey::Featured) => (
            Some(Predicate::eq(Column::IsFeatured, Value::Bool(true))),
            vec![Ordering::asc(Column::Id)],
        ),
        Some(SortKey::Popular) => (
            Some(Predicate::eq(Column::IsBestseller, Value::Bool(true))),
            vec![Ordering::asc(Column::Id)],
        ),
        None => (None, vec![Ordering::asc(Column::Id)]),
    }
}

/// Filter for a visibility mode. A missing flag counts as visible.
#[must_use]
pub fn visibility_predicate(mode: VisibilityMode) -> Option<Predicate> {
    match mode {
        VisibilityMode::All => None,
        VisibilityMode::Visible => Some(Predicate::NotFalse {
            column: Column::IsVisible,
        }),
        VisibilityMode::Hidden => Some(Predicate::eq(Column::IsVisible, Value::Bool(false))),
    }
}

/// Build the remote query for the declarative strategy.
#[must_use]
pub fn build_query(criteria: &FilterCriteria, page: PageRequest) -> ProductQuery {
    let mut query = ProductQuery::new();

    if let Some(term) = criteria.search_term() {
        query = query.filter(Predicate::any_of(
            TEXT_SEARCH_COLUMNS
                .iter()
                .map(|column| Predicate::ilike(*column, term))
                .collect(),
        ));
    }

    if !criteria.categories.is_empty() {
        query = query.filter(Predicate::in_set(Column::Category, criteria.categories.clone()));
    }
    if !criteria.gods.is_empty() {
        query = query.filter(Predicate::contains_any(Column::RelatedGods, &criteria.gods));
    }
    if !criteria.occasions.is_empty() {
        query = query.filter(Predicate::contains_any(Column::Occasions, &criteria.occasions));
    }
    if !criteria.materials.is_empty() {
        query = query.filter(Predicate::in_set(Column::Material, criteria.materials.clone()));
    }

    if let Some(range) = criteria.price_range {
        if let Some(min) = range.min {
            query = query.filter(Predicate::gte(Column::Price, Value::Decimal(min)));
        }
        if let Some(max) = range.max {
            query = query.filter(Predicate::lte(Column::Price, Value::Decimal(max)));
        }
    }

    for (column, exact) in [
        (Column::WidthIn, criteria.width),
        (Column::HeightIn, criteria.height),
        (Column::DepthIn, criteria.depth),
    ] {
        if let Some(value) = exact {
            query = query.filter(Predicate::eq(column, Value::Number(value)));
        }
    }

    if let Some(sku) = &criteria.sku_search {
        query = query.filter(Predicate::ilike(Column::Sku, sku.clone()));
    }
    if let Some(weight) = &criteria.weight_search {
        query = query.filter(Predicate::ilike(Column::Weight, weight.clone()));
    }

    for (column, range) in [
        (Column::WidthIn, criteria.width_range),
        (Column::HeightIn, criteria.height_range),
        (Column::DepthIn, criteria.depth_range),
    ] {
        let Some(range) = range else { continue };
        if let Some(min) = range.min {
            query = query.filter(Predicate::gte(column, Value::Number(min)));
        }
        if let Some(max) = range.max {
            query = query.filter(Predicate::lte(column, Value::Number(max)));
        }
    }

    if criteria.weight_range.is_some_and(|r| !r.is_unbounded()) {
        warn!(
            weight_range = ?criteria.weight_range,
            "Weight range is not applied to catalog queries: weights are stored as free text"
        );
    }

    if let Some(predicate) = visibility_predicate(criteria.visibility) {
        query = query.filter(predicate);
    }

    let (sort_filter, orderings) = sort_clause(criteria.sort);
    if let Some(predicate) = sort_filter {
        query = query.filter(predicate);
    }

    query.order_by(orderings).paginate(page)
}

/// Answer the comprehensive strategy from an already-fetched catalog.
#[must_use]
pub fn comprehensive_page(
    records: Vec<ProductRecord>,
    criteria: &FilterCriteria,
    page: PageRequest,
) -> QueryPage {
    let search = ComprehensiveSearch::new(criteria.search_term().unwrap_or_default());
    let (sort_filter, orderings) = sort_clause(criteria.sort);
    let extra: Vec<Predicate> = visibility_predicate(criteria.visibility)
        .into_iter()
        .chain(sort_filter)
        .collect();

    let mut matched: Vec<ProductRecord> = records
        .into_iter()
        .filter(|record| search.matches(record) && eval::matches_all(record, &extra))
        .collect();

    let orderings = ProductQuery::new().order_by(orderings).orderings;
    eval::sort_records(&mut matched, &orderings);

    let total_count = matched.len() as u64;
    let items = matched
        .into_iter()
        .skip(page.offset())
        .take(page.limit())
        .collect();

    QueryPage { items, total_count }
}

/// Composes listing pages against a catalog store.
#[derive(Debug, Clone)]
pub struct FilterQueryComposer<S> {
    store: S,
}

impl<S: CatalogStore> FilterQueryComposer<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Fetch one page of products matching `criteria`.
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged; callers decide how to surface it.
    #[instrument(skip(self, criteria), fields(page = page.page(), page_size = page.page_size(), strategy = tracing::field::Empty))]
    pub async fn compose(
        &self,
        criteria: &FilterCriteria,
        page: PageRequest,
    ) -> Result<QueryPage, StoreError> {
        let strategy = Strategy::for_criteria(criteria);
        tracing::Span::current().record("strategy", strategy.as_str());

        let result = match strategy {
            Strategy::Declarative => {
                let query = build_query(criteria, page);
                debug!(predicates = query.predicates.len(), "Running catalog query");
                self.store.query(&query).await?
            }
            Strategy::Comprehensive => {
                let records = self.store.fetch_all().await?;
                debug!(catalog_size = records.len(), "Running comprehensive search");
                comprehensive_page(records, criteria, page)
            }
        };

        debug!(
            returned = result.items.len(),
            total = result.total_count,
            "Composed listing page"
        );
        Ok(result)
    }
}
