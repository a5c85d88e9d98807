//! User settings read at the start of every sync cycle.
//!
//! The settings screen stores them as a small JSON document; a missing file
//! or missing keys fall back to defaults silently.

use std::path::Path;

use leaguewatch_protocol::constants::DEFAULT_SUMMONER_NAME;
use serde::{Deserialize, Serialize};

/// Errors reading or writing the settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Summoner name and optional champion override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub summoner_name: String,

    #[serde(default)]
    pub champion_override: Option<String>,
}

impl Settings {
    pub fn new(summoner_name: impl Into<String>) -> Self {
        Self {
            summoner_name: summoner_name.into(),
            champion_override: None,
        }
    }

    pub fn with_override(mut self, champion: impl Into<String>) -> Self {
        self.champion_override = Some(champion.into());
        self
    }

    /// Configured summoner name, or the default when none is stored.
    pub fn effective_summoner_name(&self) -> &str {
        let name = self.summoner_name.trim();
        if name.is_empty() {
            DEFAULT_SUMMONER_NAME
        } else {
            name
        }
    }

    /// The champion override, if one is set and non-blank.
    pub fn active_override(&self) -> Option<&str> {
        self.champion_override
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Text shown on the face: the override when active, else the summoner.
    pub fn display_text(&self) -> &str {
        self.active_override()
            .unwrap_or_else(|| self.effective_summoner_name())
    }

    /// Loads settings from a JSON file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
