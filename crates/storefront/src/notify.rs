//! Transient user-visible notifications.
//!
//! Loaders never fail loudly: a failed fetch produces an empty result and a
//! [`Toast`] handed to the injected [`Notifier`]. The presentation layer
//! decides how to show it.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Shown when a listing page cannot be loaded.
pub const PRODUCTS_LOAD_FAILED: &str = "Failed to load products. Please try again.";
/// Shown when a single product cannot be loaded.
pub const PRODUCT_LOAD_FAILED: &str = "Failed to load product details. Please try again.";
/// Shown when facet values cannot be loaded.
pub const FILTER_OPTIONS_LOAD_FAILED: &str = "Failed to load filter options. Please try again.";

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Default,
    Destructive,
}

/// A short notification for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    /// An error notification with the standard "Error" title.
    #[must_use]
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }

    /// A confirmation notification.
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }
}

/// Sink for user notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Emits notifications as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.variant {
            ToastVariant::Destructive => {
                tracing::warn!(title = %toast.title, "{}", toast.description);
            }
            ToastVariant::Default => {
                tracing::info!(title = %toast.title, "{}", toast.description);
            }
        }
    }
}

/// Keeps every notification in memory, for tests and batch drivers that
/// report at the end.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far, oldest first.
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}
