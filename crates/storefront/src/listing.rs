//! Product listing loaders.
//!
//! [`ProductListing`] is what a storefront page drives: every filter or page
//! change calls [`ProductListing::load`] and renders the returned
//! [`ListingState`]. Loads are never cancelled. Each one takes a generation
//! ticket, and a result that arrives after a newer load has started is
//! dropped instead of overwriting the newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, instrument};

use handicraft_core::{FilterCriteria, FilterOptions, PageRequest, ProductId, ProductRecord};

use crate::error::AppError;
use crate::notify::{
    FILTER_OPTIONS_LOAD_FAILED, Notifier, PRODUCT_LOAD_FAILED, PRODUCTS_LOAD_FAILED, Toast,
};
use crate::query::FilterQueryComposer;
use crate::store::CatalogStore;

/// What a listing page renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingState {
    pub items: Vec<ProductRecord>,
    pub total_count: u64,
    pub loading: bool,
    pub error: Option<String>,
}

/// Loads listing pages, single products, and facet values.
pub struct ProductListing<S, N> {
    composer: FilterQueryComposer<S>,
    notifier: N,
    generation: AtomicU64,
    state: RwLock<ListingState>,
}

impl<S: CatalogStore, N: Notifier> ProductListing<S, N> {
    #[must_use]
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            composer: FilterQueryComposer::new(store),
            notifier,
            generation: AtomicU64::new(0),
            state: RwLock::new(ListingState::default()),
        }
    }

    #[must_use]
    pub const fn composer(&self) -> &FilterQueryComposer<S> {
        &self.composer
    }

    /// The most recently committed state.
    #[must_use]
    pub fn state(&self) -> ListingState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_state(&self, f: impl FnOnce(&mut ListingState)) {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner));
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Load one page for `criteria`.
    ///
    /// Returns the committed state. When a newer load started while this
    /// one was in flight, its result is discarded and the returned state is
    /// whatever is committed at that moment.
    #[instrument(skip(self, criteria), fields(page = page.page()))]
    pub async fn load(&self, criteria: &FilterCriteria, page: PageRequest) -> ListingState {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.update_state(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = self.composer.compose(criteria, page).await;

        if !self.is_current(ticket) {
            debug!(ticket, "Discarding stale listing result");
            return self.state();
        }

        match result {
            Ok(page) => self.update_state(|state| {
                state.items = page.items;
                state.total_count = page.total_count;
                state.loading = false;
            }),
            Err(e) => {
                AppError::from(e).report("load_products");
                self.notifier.notify(Toast::error(PRODUCTS_LOAD_FAILED));
                self.update_state(|state| {
                    state.items.clear();
                    state.total_count = 0;
                    state.loading = false;
                    state.error = Some(PRODUCTS_LOAD_FAILED.to_string());
                });
            }
        }
        self.state()
    }

    /// Load a single product. Unknown ids and failures both yield `None`;
    /// failures also notify.
    #[instrument(skip(self))]
    pub async fn load_product(&self, id: ProductId) -> Option<ProductRecord> {
        match self.composer.store().fetch_by_id(id).await {
            Ok(record) => record,
            Err(e) => {
                AppError::from(e).report("load_product");
                self.notifier.notify(Toast::error(PRODUCT_LOAD_FAILED));
                None
            }
        }
    }

    /// Distinct facet values and the price bounds of the whole catalog.
    /// Failures notify and yield the defaults.
    #[instrument(skip(self))]
    pub async fn load_filter_options(&self) -> FilterOptions {
        match self.composer.store().fetch_all().await {
            Ok(records) => FilterOptions::from_records(&records),
            Err(e) => {
                AppError::from(e).report("load_filter_options");
                self.notifier.notify(Toast::error(FILTER_OPTIONS_LOAD_FAILED));
                FilterOptions::default()
            }
        }
    }
}

impl<S: std::fmt::Debug, N> std::fmt::Debug for ProductListing<S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductListing")
            .field("composer", &self.composer)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
