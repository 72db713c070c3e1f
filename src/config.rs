//! Editor settings loaded from TOML.
//!
//! ```toml
//! [notification]
//! title = "Alert"
//! click_url = "/dashboard/"
//!
//! [graph]
//! pretty_json = false
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_NOTIFICATION_TITLE: &str = "Notification";
pub const DEFAULT_NOTIFICATION_IMAGE: &str = "https://c4.wallpaperflare.com/wallpaper/347/1000/853/studio-ghibli-howl-s-moving-castle-calcifer-anime-fire-hd-wallpaper-thumb.jpg";
pub const DEFAULT_CLICK_URL: &str = "/test/";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct EditorConfig {
    #[serde(default)]
    pub notification: NotificationDefaults,
    #[serde(default)]
    pub graph: GraphSettings,
}

/// Fallbacks used when a push payload leaves a field out.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NotificationDefaults {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default = "default_click_url")]
    pub click_url: String,
}

fn default_title() -> String {
    DEFAULT_NOTIFICATION_TITLE.to_string()
}

fn default_image() -> String {
    DEFAULT_NOTIFICATION_IMAGE.to_string()
}

fn default_click_url() -> String {
    DEFAULT_CLICK_URL.to_string()
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: default_title(),
            image: default_image(),
            click_url: default_click_url(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphSettings {
    /// Pretty-print the flow JSON preview.
    #[serde(default = "default_true")]
    pub pretty_json: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self { pretty_json: true }
    }
}

impl EditorConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load editor settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load editor settings, falling back to defaults on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load editor config, using defaults: {}", e);
            Self::default()
        })
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
