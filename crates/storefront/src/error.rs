//! Unified error handling with Sentry integration.
//!
//! Each layer has its own `thiserror` enum. [`AppError`] unifies them for
//! callers that drive several layers at once (the listing loaders and the
//! CLI). Server-side failures are captured to Sentry through
//! [`AppError::report`] before they are turned into a user notification.

use thiserror::Error;

use crate::admin::ValidationError;
use crate::config::ConfigError;
use crate::settings::SettingsError;

/// Errors raised by a catalog store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request to the hosted catalog failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The hosted service rejected the request.
    #[error("Catalog service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// Rate limited by the hosted service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The referenced product does not exist.
    #[error("Product not found: {0}")]
    NotFound(String),

    /// The store URL or table name is unusable.
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    /// A row could not be mapped to a product record.
    #[error("Data corruption: {0}")]
    DataCorruption(String),
}

/// Application-level error type for the storefront library.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Settings could not be read or written.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// An edit was rejected before reaching the store.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this failure originates on the server side rather than in
    /// user input.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::Settings(_) | Self::Internal(_)
        )
    }

    /// Capture server-side errors to Sentry and log them.
    ///
    /// User errors (validation, not found) are logged at `warn` only.
    pub fn report(&self, context: &str) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                context,
                "Catalog operation failed"
            );
        } else {
            tracing::warn!(error = %self, context, "Catalog operation rejected");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of filter
/// changes and edits leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
