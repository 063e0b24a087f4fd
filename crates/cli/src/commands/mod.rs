//! CLI command implementations.

pub mod admin;
pub mod catalog;
pub mod migrate;
pub mod settings;

use std::path::PathBuf;

use serde::Serialize;

use handicraft_core::DEFAULT_PAGE_SIZE;
use handicraft_storefront::config::{CatalogConfig, DEFAULT_SETTINGS_PATH};
use handicraft_storefront::settings::JsonFileSettingsStore;

/// Values shared by every command, available even without a store URL.
#[derive(Debug, Clone)]
pub struct Context {
    pub page_size: u32,
    pub settings_path: PathBuf,
}

impl Context {
    pub fn new(config: Option<&CatalogConfig>) -> Self {
        config.map_or_else(
            || Self {
                page_size: DEFAULT_PAGE_SIZE,
                settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            },
            |config| Self {
                page_size: config.page_size,
                settings_path: config.settings_path.clone(),
            },
        )
    }

    pub fn settings_store(&self) -> JsonFileSettingsStore {
        JsonFileSettingsStore::new(&self.settings_path)
    }
}

/// Write a value to stdout as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}
