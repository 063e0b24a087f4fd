//! Catalog configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CATALOG_STORE_URL` - Hosted catalog base URL (`https://...`) or
//!   `PostgreSQL` connection string (`postgres://...`). Falls back to
//!   `DATABASE_URL` when unset.
//! - `CATALOG_API_KEY` - API key for the hosted catalog (REST backend only)
//!
//! ## Optional
//! - `CATALOG_TABLE` - Products table name (default: products)
//! - `CATALOG_PAGE_SIZE` - Listing page size (default: 12)
//! - `CATALOG_CACHE_TTL_SECS` - Cache lifetime for bulk reads (default: 300)
//! - `CATALOG_SETTINGS_PATH` - Local settings file (default: .handicraft-settings.json)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use handicraft_core::DEFAULT_PAGE_SIZE;

const DEFAULT_TABLE: &str = "products";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Settings file used when `CATALOG_SETTINGS_PATH` is unset.
pub const DEFAULT_SETTINGS_PATH: &str = ".handicraft-settings.json";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which catalog store backend a URL selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgREST-compatible hosted service over HTTPS.
    Rest,
    /// Direct `PostgreSQL` connection.
    Postgres,
}

/// Catalog application configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Store URL (may contain a database password)
    pub store_url: SecretString,
    /// Backend selected from the URL scheme
    pub backend: StoreBackend,
    /// API key sent to the hosted catalog
    pub api_key: Option<SecretString>,
    /// Products table name
    pub table: String,
    /// Listing page size
    pub page_size: u32,
    /// Lifetime of cached bulk reads
    pub cache_ttl: Duration,
    /// Path of the local settings file
    pub settings_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("store_url", &"[REDACTED]")
            .field("backend", &self.backend)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("table", &self.table)
            .field("page_size", &self.page_size)
            .field("cache_ttl", &self.cache_ttl)
            .field("settings_path", &self.settings_path)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("CATALOG_STORE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .ok_or_else(|| ConfigError::MissingEnvVar("CATALOG_STORE_URL".to_string()))?;
        let backend = backend_for_url(&raw_url)?;

        let api_key = match backend {
            StoreBackend::Rest => Some(get_validated_secret(&lookup, "CATALOG_API_KEY")?),
            StoreBackend::Postgres => None,
        };

        let table = lookup("CATALOG_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string());
        validate_table_name(&table)?;

        let page_size = parse_or_default(&lookup, "CATALOG_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_PAGE_SIZE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let cache_ttl_secs =
            parse_or_default(&lookup, "CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;

        Ok(Self {
            store_url: SecretString::from(raw_url),
            backend,
            api_key,
            table,
            page_size,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            settings_path: lookup("CATALOG_SETTINGS_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH), PathBuf::from),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// API key as plain text, empty when the backend needs none.
    #[must_use]
    pub fn api_key_str(&self) -> &str {
        self.api_key
            .as_ref()
            .map_or("", |key| key.expose_secret())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Pick the store backend from the URL scheme.
fn backend_for_url(raw: &str) -> Result<StoreBackend, ConfigError> {
    let url = url::Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("CATALOG_STORE_URL".to_string(), e.to_string())
    })?;
    match url.scheme() {
        "https" | "http" => Ok(StoreBackend::Rest),
        "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
        other => Err(ConfigError::InvalidEnvVar(
            "CATALOG_STORE_URL".to_string(),
            format!("unsupported scheme '{other}' (expected https or postgres)"),
        )),
    }
}

/// Table names are interpolated into SQL and URL paths, so only plain
/// identifiers are accepted.
fn validate_table_name(table: &str) -> Result<(), ConfigError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            "CATALOG_TABLE".to_string(),
            format!("'{table}' is not a plain identifier"),
        ))
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the catalog service."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret.
fn get_validated_secret<F>(lookup: &F, key: &str) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
