//! Persisted user preferences.
//!
//! Preferences live behind the [`SettingsStore`] trait and are passed in
//! explicitly. Values are stored as JSON under string keys; the typed
//! helpers below fall back to defaults for missing or unreadable entries.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use handicraft_core::{DisplaySettings, UnknownPreset, VisibilityMode};

/// Key for the product card display settings.
pub const DISPLAY_SETTINGS_KEY: &str = "display_settings";
/// Key for the preferred visibility mode of the listing.
pub const VISIBILITY_MODE_KEY: &str = "visibility_mode";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    UnknownPreset(#[from] UnknownPreset),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Key/value storage for preferences.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, SettingsError>> + Send;

    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<(), SettingsError>> + Send;

    /// Every stored entry, ordered by key.
    fn entries(&self) -> impl Future<Output = Result<BTreeMap<String, Value>, SettingsError>> + Send;
}

/// Preferences kept for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    values: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn entries(&self) -> Result<BTreeMap<String, Value>, SettingsError> {
        Ok(self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Preferences stored in a JSON object on the local device.
///
/// Every write rewrites the whole file. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl JsonFileSettingsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file a write lands in before it replaces [`Self::path`].
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Value>, SettingsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SettingsStore for JsonFileSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Readers see either the old file or the new one, never a partial write
        let staging = self.staging_path();
        tokio::fs::write(&staging, serde_json::to_vec_pretty(&values)?).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        debug!(key, path = %self.path.display(), "Saved setting");
        Ok(())
    }

    async fn entries(&self) -> Result<BTreeMap<String, Value>, SettingsError> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }
}

/// Stored display settings, or the "essential" preset when none are saved.
///
/// # Errors
///
/// Returns `SettingsError` if the store cannot be read. An entry that no
/// longer deserializes is logged and replaced by the default.
pub async fn load_display_settings<S: SettingsStore>(
    store: &S,
) -> Result<DisplaySettings, SettingsError> {
    load_or_default(store, DISPLAY_SETTINGS_KEY).await
}

/// # Errors
///
/// Returns `SettingsError` if the store cannot be written.
pub async fn save_display_settings<S: SettingsStore>(
    store: &S,
    settings: &DisplaySettings,
) -> Result<(), SettingsError> {
    store
        .set(DISPLAY_SETTINGS_KEY, serde_json::to_value(settings)?)
        .await
}

/// Stored visibility mode, or "all" when none is saved.
///
/// # Errors
///
/// Returns `SettingsError` if the store cannot be read.
pub async fn load_visibility_mode<S: SettingsStore>(
    store: &S,
) -> Result<VisibilityMode, SettingsError> {
    load_or_default(store, VISIBILITY_MODE_KEY).await
}

/// # Errors
///
/// Returns `SettingsError` if the store cannot be written.
pub async fn save_visibility_mode<S: SettingsStore>(
    store: &S,
    mode: VisibilityMode,
) -> Result<(), SettingsError> {
    store
        .set(VISIBILITY_MODE_KEY, serde_json::to_value(mode)?)
        .await
}

async fn load_or_default<S, T>(store: &S, key: &str) -> Result<T, SettingsError>
where
    S: SettingsStore,
    T: serde::de::DeserializeOwned + Default,
{
    let Some(value) = store.get(key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!(key, error = %e, "Ignoring unreadable setting");
            Ok(T::default())
        }
    }
}
