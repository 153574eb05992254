//! Persisted per-area view preferences.
//!
//! Stored as a small JSON document, by default under the user data
//! directory (`aegis/preferences.json`). A missing or unreadable file means
//! defaults; it is never an error to read preferences.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ViewError, ViewMode};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Preferences {
    #[serde(default)]
    view_modes: BTreeMap<String, ViewMode>,
}

#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    prefs: Preferences,
}

impl PreferenceStore {
    /// `<data dir>/aegis/preferences.json`.
    pub fn default_path() -> Result<PathBuf, ViewError> {
        dirs::data_dir()
            .map(|d| d.join("aegis").join("preferences.json"))
            .ok_or(ViewError::NoPreferencesDir)
    }

    /// Open the store at `path`, reading existing preferences if any.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let prefs = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring unreadable preferences");
                Preferences::default()
            }),
            Err(_) => Preferences::default(),
        };
        Self { path, prefs }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved mode for a feature area, or the default.
    pub fn view_mode(&self, area: &str) -> ViewMode {
        self.prefs.view_modes.get(area).copied().unwrap_or_default()
    }

    /// Save the mode for a feature area and write the file.
    pub fn set_view_mode(&mut self, area: &str, mode: ViewMode) -> Result<(), ViewError> {
        self.prefs.view_modes.insert(area.to_string(), mode);
        self.save()
    }

    fn save(&self) -> Result<(), ViewError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.prefs)?)?;
        debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}
