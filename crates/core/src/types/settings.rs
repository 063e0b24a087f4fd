//! Display preferences for product cards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown preset name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown display preset: {0} (expected essential, complete or minimal)")]
pub struct UnknownPreset(pub String);

/// Which product attributes are shown on listing cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplaySettings {
    pub show_stock: bool,
    pub show_price: bool,
    pub show_dimensions: bool,
    pub show_material: bool,
    pub show_tags: bool,
    pub show_vendor: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplayPreset::Essential.settings()
    }
}

impl DisplaySettings {
    /// The preset these settings correspond to, if any.
    #[must_use]
    pub fn matching_preset(&self) -> Option<DisplayPreset> {
        DisplayPreset::ALL
            .into_iter()
            .find(|preset| preset.settings() == *self)
    }
}

/// Named combinations of [`DisplaySettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayPreset {
    /// Stock, price, dimensions, and material.
    Essential,
    /// Everything.
    Complete,
    /// Price and material only.
    Minimal,
}

impl DisplayPreset {
    pub const ALL: [Self; 3] = [Self::Essential, Self::Complete, Self::Minimal];

    #[must_use]
    pub const fn settings(self) -> DisplaySettings {
        match self {
            Self::Essential => DisplaySettings {
                show_stock: true,
                show_price: true,
                show_dimensions: true,
                show_material: true,
                show_tags: false,
                show_vendor: false,
            },
            Self::Complete => DisplaySettings {
                show_stock: true,
                show_price: true,
                show_dimensions: true,
                show_material: true,
                show_tags: true,
                show_vendor: true,
            },
            Self::Minimal => DisplaySettings {
                show_stock: false,
                show_price: true,
                show_dimensions: false,
                show_material: true,
                show_tags: false,
                show_vendor: false,
            },
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Essential => "essential",
            Self::Complete => "complete",
            Self::Minimal => "minimal",
        }
    }
}

impl FromStr for DisplayPreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "essential" => Ok(Self::Essential),
            "complete" => Ok(Self::Complete),
            "minimal" => Ok(Self::Minimal),
            _ => Err(UnknownPreset(s.to_string())),
        }
    }
}

impl fmt::Display for DisplayPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
