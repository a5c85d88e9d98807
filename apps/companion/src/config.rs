//! Companion configuration.
//!
//! Stored as TOML at `~/.config/leaguewatch/companion.toml`; a default file
//! is written on first run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use leaguewatch_handheld::{Settings, StageTimeouts};
use leaguewatch_riot_api::Endpoints;
use serde::{Deserialize, Serialize};

/// Companion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionConfig {
    /// Summoner to follow (empty = default summoner).
    #[serde(default)]
    pub summoner_name: String,

    /// Champion to show regardless of games (empty = disabled).
    #[serde(default)]
    pub champion_override: String,

    /// File holding the stats API key.
    #[serde(default = "default_api_key_file")]
    pub api_key_file: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_platform")]
    pub platform: String,

    #[serde(default = "default_regional_base_url")]
    pub regional_base_url: String,

    #[serde(default = "default_global_base_url")]
    pub global_base_url: String,

    #[serde(default = "default_cdn_base_url")]
    pub cdn_base_url: String,

    /// Deadline for each API and CDN stage, in seconds.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
}

fn default_api_key_file() -> String {
    "~/.config/leaguewatch/key.txt".into()
}

fn default_region() -> String {
    "na".into()
}

fn default_platform() -> String {
    "NA1".into()
}

fn default_regional_base_url() -> String {
    "https://na.api.pvp.net".into()
}

fn default_global_base_url() -> String {
    "https://global.api.pvp.net".into()
}

fn default_cdn_base_url() -> String {
    "http://ddragon.leagueoflegends.com".into()
}

fn default_stage_timeout_secs() -> u64 {
    10
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            summoner_name: String::new(),
            champion_override: String::new(),
            api_key_file: default_api_key_file(),
            region: default_region(),
            platform: default_platform(),
            regional_base_url: default_regional_base_url(),
            global_base_url: default_global_base_url(),
            cdn_base_url: default_cdn_base_url(),
            stage_timeout_secs: default_stage_timeout_secs(),
        }
    }
}

impl CompanionConfig {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        let settings = Settings::new(self.summoner_name.clone());
        if self.champion_override.trim().is_empty() {
            settings
        } else {
            settings.with_override(self.champion_override.clone())
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            regional_base_url: self.regional_base_url.clone(),
            global_base_url: self.global_base_url.clone(),
            region: self.region.clone(),
            platform: self.platform.clone(),
        }
    }

    pub fn stage_timeouts(&self) -> StageTimeouts {
        StageTimeouts::uniform(Duration::from_secs(self.stage_timeout_secs.max(1)))
    }

    /// API key path with a leading `~` expanded.
    pub fn api_key_path(&self) -> PathBuf {
        expand_home(&self.api_key_file)
    }
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".into()))
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None if path == "~" => home_dir(),
        None => PathBuf::from(path),
    }
}

fn config_path() -> PathBuf {
    home_dir()
        .join(".config")
        .join("leaguewatch")
        .join("companion.toml")
}
