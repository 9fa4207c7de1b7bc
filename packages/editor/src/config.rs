//! # Editor configuration — `scribe-editor.toml`
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:8080"
//!
//! [autosave]
//! delay_ms = 5000   # quiet period after the last keystroke
//! ```
//!
//! Every section has a default, so a missing or empty file is the default
//! configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `scribe-editor.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub autosave: AutosaveConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Autosave timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutosaveConfig {
    /// Milliseconds without an edit before the draft is written.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_delay_ms() -> u64 {
    5000
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

impl AutosaveConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl EditorConfig {
    /// Builder method to set the autosave delay.
    pub fn with_autosave_delay(mut self, delay: Duration) -> Self {
        self.autosave.delay_ms = delay.as_millis() as u64;
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "scribe-editor.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
