//! Listing composition integration tests.
//!
//! Drives `FilterQueryComposer` and `ProductListing` end to end against an
//! in-memory catalog: strategy selection, filtering, sorting, paging, and
//! facet discovery.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use rust_decimal::Decimal;

use handicraft_core::{
    DEFAULT_PAGE_SIZE, FilterCriteria, PageRequest, ProductId, RawFilterInput, RawRange, VisibilityMode,
};
use handicraft_integration_tests::{
    BRASS_IDS, SAMPLE_SIZE, brass_category_store, ids, sample_store, weighted_product,
};
use handicraft_storefront::debounce::Debouncer;
use handicraft_storefront::notify::RecordingNotifier;
use handicraft_storefront::query::Strategy;
use handicraft_storefront::{FilterQueryComposer, MemoryCatalogStore, ProductListing};

fn criteria(raw: RawFilterInput) -> FilterCriteria {
    FilterCriteria::from_raw(raw)
}

fn first_page() -> PageRequest {
    PageRequest::default()
}

// =============================================================================
// Default Listing
// =============================================================================

#[tokio::test]
async fn test_no_filters_returns_first_page_by_id() {
    let composer = FilterQueryComposer::new(sample_store());
    let page = composer
        .compose(&FilterCriteria::default(), first_page())
        .await
        .unwrap();

    assert_eq!(page.total_count, SAMPLE_SIZE as u64);
    assert_eq!(page.items.len(), DEFAULT_PAGE_SIZE as usize);
    assert_eq!(ids(&page.items), (1..=12).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_pages_cover_catalog_exactly_once() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = FilterCriteria::default();

    let mut seen = Vec::new();
    for number in 1..=4 {
        let page = composer
            .compose(&criteria, PageRequest::new(number, 4))
            .await
            .unwrap();
        assert_eq!(page.total_count, SAMPLE_SIZE as u64);
        seen.extend(ids(&page.items));
    }

    assert_eq!(seen, (1..=SAMPLE_SIZE).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_page_past_end_is_empty_with_total() {
    let composer = FilterQueryComposer::new(sample_store());
    let page = composer
        .compose(&FilterCriteria::default(), PageRequest::new(3, 12))
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_count, SAMPLE_SIZE as u64);
}

// =============================================================================
// Facets and Ranges
// =============================================================================

#[tokio::test]
async fn test_material_facet_counts_matches_not_page() {
    // 15 products, 3 of them Brass
    let listing = ProductListing::new(sample_store(), RecordingNotifier::new());
    let brass = criteria(RawFilterInput {
        materials: Some(vec!["Brass".to_string()]),
        ..RawFilterInput::default()
    });

    let state = listing.load(&brass, first_page()).await;
    assert_eq!(ids(&state.items), BRASS_IDS.to_vec());
    assert_eq!(state.total_count, 3);
    assert!(state.error.is_none());

    let second = listing.load(&brass, PageRequest::new(2, DEFAULT_PAGE_SIZE)).await;
    assert!(second.items.is_empty());
    assert_eq!(second.total_count, 3);
}

#[tokio::test]
async fn test_category_facet_counts_matches_not_page() {
    let listing = ProductListing::new(brass_category_store(), RecordingNotifier::new());
    let brass = criteria(RawFilterInput {
        categories: Some(vec!["Brass".to_string()]),
        ..RawFilterInput::default()
    });

    let state = listing.load(&brass, first_page()).await;
    assert_eq!(ids(&state.items), BRASS_IDS.to_vec());
    assert_eq!(state.total_count, 3);

    let second = listing.load(&brass, PageRequest::new(2, DEFAULT_PAGE_SIZE)).await;
    assert!(second.items.is_empty());
    assert_eq!(second.total_count, 3);
    assert!(second.error.is_none());
}

#[tokio::test]
async fn test_price_range_is_inclusive() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        price_range: Some(RawRange::new(Some("1000"), Some("2500"))),
        ..RawFilterInput::default()
    });

    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), (4..=10).collect::<Vec<_>>());
    for record in &page.items {
        assert!(record.price >= Decimal::new(1000, 0));
        assert!(record.price <= Decimal::new(2500, 0));
    }
}

#[tokio::test]
async fn test_malformed_bounds_are_ignored() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        price_range: Some(RawRange::new(Some("cheap"), Some("1000"))),
        ..RawFilterInput::default()
    });

    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_facets_combine_with_and() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        categories: Some(vec!["Idols".to_string()]),
        occasions: Some(vec!["Diwali".to_string()]),
        ..RawFilterInput::default()
    });

    // Odd ids that are multiples of 3
    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![3, 9, 15]);
}

#[tokio::test]
async fn test_multiple_values_in_one_facet_combine_with_or() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        gods: Some(vec!["Lakshmi".to_string(), "Unknown".to_string()]),
        ..RawFilterInput::default()
    });

    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![4, 8, 12]);
}

#[tokio::test]
async fn test_sku_search_is_substring() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        sku_search: Some("hc-01".to_string()),
        ..RawFilterInput::default()
    });

    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), (10..=15).collect::<Vec<_>>());
}

// =============================================================================
// Search Strategies
// =============================================================================

#[tokio::test]
async fn test_weight_search_includes_heavier_items() {
    let store = MemoryCatalogStore::new(vec![
        weighted_product(1, "1kg"),
        weighted_product(2, "3kg"),
    ]);
    let composer = FilterQueryComposer::new(store);
    let criteria = criteria(RawFilterInput {
        search: Some("2kg".to_string()),
        ..RawFilterInput::default()
    });
    assert_eq!(Strategy::for_criteria(&criteria), Strategy::Comprehensive);

    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![2]);
    assert_eq!(page.total_count, 1);
}

#[tokio::test]
async fn test_weight_search_is_inclusive() {
    let store = MemoryCatalogStore::new(vec![
        weighted_product(1, "1kg"),
        weighted_product(2, "2kg"),
        weighted_product(3, "3000g"),
    ]);
    let composer = FilterQueryComposer::new(store);
    let criteria = criteria(RawFilterInput {
        search: Some("2kg".to_string()),
        ..RawFilterInput::default()
    });

    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![2, 3]);
}

#[tokio::test]
async fn test_weight_search_over_sample_catalog_pages_after_matching() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        search: Some("2kg".to_string()),
        ..RawFilterInput::default()
    });

    // Every product not weighing 1kg
    let page = composer
        .compose(&criteria, PageRequest::new(2, 4))
        .await
        .unwrap();
    assert_eq!(page.total_count, 10);
    assert_eq!(ids(&page.items), vec![8, 9, 11, 12]);
}

#[tokio::test]
async fn test_search_with_category_uses_declarative_path() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        search: Some("Item 1".to_string()),
        categories: Some(vec!["Idols".to_string()]),
        ..RawFilterInput::default()
    });
    assert_eq!(Strategy::for_criteria(&criteria), Strategy::Declarative);

    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![1, 11, 13, 15]);
}

#[tokio::test]
async fn test_weight_term_with_category_matches_weight_text_only() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        search: Some("2kg".to_string()),
        categories: Some(vec!["Idols".to_string()]),
        ..RawFilterInput::default()
    });
    assert_eq!(Strategy::for_criteria(&criteria), Strategy::Declarative);

    // Idols weighing 3kg are heavier but do not mention "2kg"
    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![5, 11]);
    assert!(
        page.items
            .iter()
            .all(|r| r.weight.as_deref().is_some_and(|w| w.contains("2kg")))
    );
}

#[tokio::test]
async fn test_comprehensive_search_matches_list_fields() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        search: Some("lakshmi".to_string()),
        ..RawFilterInput::default()
    });

    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![4, 8, 12]);
}

#[tokio::test]
async fn test_clearing_filters_keeps_search() {
    let mut criteria = criteria(RawFilterInput {
        search: Some("2kg".to_string()),
        materials: Some(vec!["Brass".to_string()]),
        ..RawFilterInput::default()
    });
    assert_eq!(Strategy::for_criteria(&criteria), Strategy::Declarative);

    criteria = criteria.clear_filters();
    assert_eq!(criteria.search.as_deref(), Some("2kg"));
    assert_eq!(Strategy::for_criteria(&criteria), Strategy::Comprehensive);
}

// =============================================================================
// Sorting
// =============================================================================

#[tokio::test]
async fn test_price_ascending_is_monotonic() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        sort: Some("price-asc".to_string()),
        ..RawFilterInput::default()
    });

    let page = composer
        .compose(&criteria, PageRequest::new(1, 15))
        .await
        .unwrap();
    assert!(page.items.windows(2).all(|w| w[0].price <= w[1].price));
}

#[tokio::test]
async fn test_price_descending_starts_with_most_expensive() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        sort: Some("price-desc".to_string()),
        ..RawFilterInput::default()
    });

    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(page.items[0].id.as_i64(), SAMPLE_SIZE);
    assert!(page.items.windows(2).all(|w| w[0].price >= w[1].price));
}

#[tokio::test]
async fn test_newest_orders_by_creation_descending() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        sort: Some("newest".to_string()),
        ..RawFilterInput::default()
    });

    let page = composer
        .compose(&criteria, PageRequest::new(1, 3))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![15, 14, 13]);
}

#[tokio::test]
async fn test_featured_and_popular_restrict_the_set() {
    let composer = FilterQueryComposer::new(sample_store());

    let featured = criteria(RawFilterInput {
        sort: Some("featured".to_string()),
        ..RawFilterInput::default()
    });
    let page = composer.compose(&featured, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![4, 8, 12]);
    assert_eq!(page.total_count, 3);

    let popular = criteria(RawFilterInput {
        sort: Some("popular".to_string()),
        ..RawFilterInput::default()
    });
    let page = composer.compose(&popular, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![3, 6, 9, 12, 15]);
}

#[tokio::test]
async fn test_unknown_sort_falls_back_to_id_order() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        sort: Some("alphabetical".to_string()),
        ..RawFilterInput::default()
    });

    let page = composer
        .compose(&criteria, PageRequest::new(1, 3))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![1, 2, 3]);
}

// =============================================================================
// Visibility
// =============================================================================

#[tokio::test]
async fn test_visibility_modes_partition_catalog() {
    let composer = FilterQueryComposer::new(sample_store());
    let page = PageRequest::new(1, 20);

    let mut totals = Vec::new();
    for mode in [VisibilityMode::All, VisibilityMode::Visible, VisibilityMode::Hidden] {
        let criteria = FilterCriteria {
            visibility: mode,
            ..FilterCriteria::default()
        };
        let result = composer.compose(&criteria, page).await.unwrap();
        assert!(result.items.iter().all(|r| mode.admits(r.is_visible)));
        totals.push(result.total_count);
    }

    assert_eq!(totals, vec![15, 12, 3]);
}

#[tokio::test]
async fn test_hidden_mode_applies_to_comprehensive_search() {
    let composer = FilterQueryComposer::new(sample_store());
    let criteria = criteria(RawFilterInput {
        search: Some("handmade".to_string()),
        visibility: Some("hidden".to_string()),
        ..RawFilterInput::default()
    });
    assert_eq!(Strategy::for_criteria(&criteria), Strategy::Comprehensive);

    let page = composer.compose(&criteria, first_page()).await.unwrap();
    assert_eq!(ids(&page.items), vec![5, 10, 15]);
}

// =============================================================================
// Listing State and Facet Options
// =============================================================================

#[tokio::test]
async fn test_listing_commits_last_loaded_page() {
    let listing = ProductListing::new(sample_store(), RecordingNotifier::new());
    listing
        .load(&FilterCriteria::default(), PageRequest::new(2, 5))
        .await;

    let state = listing.state();
    assert_eq!(ids(&state.items), vec![6, 7, 8, 9, 10]);
    assert_eq!(state.total_count, 15);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_filter_options_reflect_catalog() {
    let listing = ProductListing::new(sample_store(), RecordingNotifier::new());
    let options = listing.load_filter_options().await;

    assert_eq!(options.categories, vec!["Decor", "Idols"]);
    assert_eq!(options.materials, vec!["Brass", "Copper", "Marble", "Wood"]);
    assert_eq!(options.gods, vec!["Ganesha", "Lakshmi"]);
    assert_eq!(options.occasions, vec!["Diwali"]);
    assert_eq!(options.min_price, Decimal::new(250, 0));
    assert_eq!(options.max_price, Decimal::new(3750, 0));
}

#[tokio::test]
async fn test_load_product_by_id() {
    let listing = ProductListing::new(sample_store(), RecordingNotifier::new());
    let record = listing
        .load_product(ProductId::new(8))
        .await
        .unwrap();
    assert_eq!(record.material, "Brass");

    assert!(
        listing
            .load_product(ProductId::new(99))
            .await
            .is_none()
    );
    assert!(listing.state().error.is_none());
}

// =============================================================================
// Debounced Search
// =============================================================================

#[tokio::test]
async fn test_debounced_terms_load_only_the_settled_term() {
    let (tx, mut debouncer) = Debouncer::new(Duration::from_millis(20));
    let typing = tokio::spawn(async move {
        for term in ["b", "br", "bra", "brass"] {
            tx.push(term.to_string());
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        tx.push("2kg".to_string());
    });

    let notifier = RecordingNotifier::new();
    let listing = ProductListing::new(sample_store(), notifier.clone());
    let mut loaded = Vec::new();
    while let Some(term) = debouncer.next().await {
        let criteria = criteria(RawFilterInput {
            search: Some(term.clone()),
            ..RawFilterInput::default()
        });
        let state = listing.load(&criteria, first_page()).await;
        loaded.push((term, state.total_count));
    }
    typing.await.unwrap();

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0], ("brass".to_string(), 3));
    assert_eq!(loaded[1].0, "2kg");
    assert!(notifier.toasts().is_empty());
}
