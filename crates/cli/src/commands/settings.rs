//! Display preference commands.

use std::collections::BTreeMap;

use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;

use handicraft_core::{DisplayPreset, DisplaySettings, VisibilityMode};
use handicraft_storefront::settings::{
    DISPLAY_SETTINGS_KEY, SettingsError, SettingsStore, VISIBILITY_MODE_KEY,
    load_display_settings, load_visibility_mode, save_display_settings,
};

use super::{Context, print_json};

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print the effective preferences
    Show,
    /// Store a raw JSON value for a known key
    Set {
        /// `display_settings` or `visibility_mode`
        key: String,
        /// JSON value, e.g. '"hidden"' or '{"showStock": false}'
        value: String,
    },
    /// Apply a display preset: essential, complete, or minimal
    Preset { name: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsOutput {
    display_settings: DisplaySettings,
    preset: Option<DisplayPreset>,
    visibility_mode: VisibilityMode,
    stored: BTreeMap<String, Value>,
}

pub async fn run(context: &Context, action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = context.settings_store();

    match action {
        SettingsAction::Show => {}
        SettingsAction::Set { key, value } => {
            let value: Value = serde_json::from_str(&value)?;
            check_value(&key, &value)?;
            store.set(&key, value).await?;
        }
        SettingsAction::Preset { name } => {
            let preset: DisplayPreset = name.parse().map_err(SettingsError::from)?;
            save_display_settings(&store, &preset.settings()).await?;
            tracing::info!(preset = %preset, "Display preset applied");
        }
    }

    let display_settings = load_display_settings(&store).await?;
    print_json(&SettingsOutput {
        preset: display_settings.matching_preset(),
        display_settings,
        visibility_mode: load_visibility_mode(&store).await?,
        stored: store.entries().await?,
    })?;
    Ok(())
}

/// Only known keys with well-formed values may be stored.
fn check_value(key: &str, value: &Value) -> Result<(), SettingsError> {
    let invalid = |message: String| SettingsError::InvalidValue {
        key: key.to_string(),
        message,
    };
    match key {
        DISPLAY_SETTINGS_KEY => serde_json::from_value::<DisplaySettings>(value.clone())
            .map(|_| ())
            .map_err(|e| invalid(e.to_string())),
        VISIBILITY_MODE_KEY => serde_json::from_value::<VisibilityMode>(value.clone())
            .map(|_| ())
            .map_err(|e| invalid(e.to_string())),
        other => Err(invalid(format!("unknown setting '{other}'"))),
    }
}
