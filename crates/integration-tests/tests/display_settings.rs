//! Display settings integration tests.
//!
//! Preferences written through one settings store handle must be readable
//! through a fresh handle on the same file, and the saved visibility mode
//! must drive what a listing shows.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use serde_json::json;

use handicraft_core::{DisplayPreset, DisplaySettings, FilterCriteria, PageRequest, VisibilityMode};
use handicraft_integration_tests::{ids, sample_store};
use handicraft_storefront::ProductListing;
use handicraft_storefront::notify::RecordingNotifier;
use handicraft_storefront::settings::{
    DISPLAY_SETTINGS_KEY, JsonFileSettingsStore, MemorySettingsStore, SettingsStore,
    load_display_settings, load_visibility_mode, save_display_settings, save_visibility_mode,
};

fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("handicraft-settings-{}", std::process::id()))
        .join(format!("{name}.json"))
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_preferences_survive_reopening_the_file() {
    let path = scratch_file("reopen");
    let _ = tokio::fs::remove_file(&path).await;

    let first = JsonFileSettingsStore::new(&path);
    save_display_settings(&first, &DisplayPreset::Complete.settings())
        .await
        .unwrap();
    save_visibility_mode(&first, VisibilityMode::Hidden)
        .await
        .unwrap();

    let second = JsonFileSettingsStore::new(&path);
    let settings = load_display_settings(&second).await.unwrap();
    assert_eq!(settings.matching_preset(), Some(DisplayPreset::Complete));
    assert_eq!(
        load_visibility_mode(&second).await.unwrap(),
        VisibilityMode::Hidden
    );

    tokio::fs::remove_file(&path).await.unwrap();
}

#[tokio::test]
async fn test_missing_file_reads_as_defaults() {
    let path = scratch_file("missing");
    let _ = tokio::fs::remove_file(&path).await;

    let store = JsonFileSettingsStore::new(&path);
    assert_eq!(
        load_display_settings(&store).await.unwrap(),
        DisplaySettings::default()
    );
    assert_eq!(
        load_visibility_mode(&store).await.unwrap(),
        VisibilityMode::All
    );
    assert!(store.entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_display_settings_fill_in_defaults() {
    let store = MemorySettingsStore::new();
    store
        .set(DISPLAY_SETTINGS_KEY, json!({ "showTags": true }))
        .await
        .unwrap();

    let settings = load_display_settings(&store).await.unwrap();
    assert!(settings.show_tags);
    assert!(settings.show_price);
    assert_eq!(settings.matching_preset(), None);
}

// =============================================================================
// Listings
// =============================================================================

#[tokio::test]
async fn test_saved_visibility_drives_listing() {
    let settings = MemorySettingsStore::new();
    save_visibility_mode(&settings, VisibilityMode::Visible)
        .await
        .unwrap();

    let criteria = FilterCriteria {
        visibility: load_visibility_mode(&settings).await.unwrap(),
        ..FilterCriteria::default()
    };
    let listing = ProductListing::new(sample_store(), RecordingNotifier::new());
    let state = listing.load(&criteria, PageRequest::new(1, 6)).await;

    assert_eq!(state.total_count, 12);
    assert_eq!(ids(&state.items), vec![1, 2, 3, 4, 6, 7]);
}
