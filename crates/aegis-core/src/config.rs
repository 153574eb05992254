//! Client configuration, loaded from an optional TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::CoreError;
use crate::history::DEFAULT_CAPACITY;

/// Settings shared by every part of the review client.
///
/// Every key is optional in the file; absent keys take the defaults below.
///
/// ```toml
/// base_url = "https://aegis.example.org"
/// stats_ttl_secs = 15
/// history_capacity = 50
/// search_debounce_ms = 250
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AegisConfig {
    /// Backend root, no trailing slash needed.
    pub base_url: String,
    /// Freshness window of the review-stats cache.
    pub stats_ttl_secs: u64,
    /// Undo/redo entries kept per context.
    pub history_capacity: usize,
    /// Delay before a typed search is applied.
    pub search_debounce_ms: u64,
    pub request_timeout_secs: u64,
    /// Token from the page meta tag, the lowest-priority CSRF source.
    pub csrf_token: Option<String>,
    /// Where view-mode preferences are stored. Defaults to the user data dir.
    pub preferences_path: Option<PathBuf>,
}

impl Default for AegisConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5050".into(),
            stats_ttl_secs: 15,
            history_capacity: DEFAULT_CAPACITY,
            search_debounce_ms: 250,
            request_timeout_secs: 30,
            csrf_token: None,
            preferences_path: None,
        }
    }
}

impl AegisConfig {
    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        info!(path = %path.display(), base_url = %config.base_url, "loaded config");
        Ok(config)
    }

    /// Read `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CoreError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
