//! Configuration file support for Zen.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/zen/config.toml`.

use crate::catalog::{get_default_catalog, DEFAULT_TECHNIQUE_ID};
use crate::ledger::DayBoundary;
use crate::{Error, Result, MAX_SESSION_MINUTES, MIN_SESSION_MINUTES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionDefaults,

    #[serde(default)]
    pub streak: StreakConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Key-value storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Namespace prepended to every progress key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
        }
    }
}

/// Defaults offered when starting a session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionDefaults {
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,

    #[serde(default = "default_technique")]
    pub default_technique: String,

    #[serde(default = "default_presets")]
    pub presets: Vec<u32>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
            default_technique: default_technique(),
            presets: default_presets(),
        }
    }
}

impl SessionDefaults {
    /// Resolve a quick-pick duration, which must be one of the listed presets
    pub fn preset(&self, minutes: u32) -> Result<u32> {
        if self.presets.contains(&minutes) {
            return Ok(minutes);
        }
        let available: Vec<String> = self.presets.iter().map(|m| m.to_string()).collect();
        Err(Error::InvalidSession(format!(
            "unknown preset {}; available presets: {}",
            minutes,
            available.join(", ")
        )))
    }
}

/// Streak bookkeeping configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct StreakConfig {
    #[serde(default)]
    pub day_boundary: DayBoundary,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("zen")
}

fn default_key_prefix() -> String {
    "zen".into()
}

fn default_minutes() -> u32 {
    10
}

fn default_technique() -> String {
    DEFAULT_TECHNIQUE_ID.into()
}

fn default_presets() -> Vec<u32> {
    vec![5, 10, 15, 20]
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("zen").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Check values a session would be started with
    pub fn validate(&self) -> Result<()> {
        let in_range = |m: u32| (MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&m);

        if !in_range(self.session.default_minutes) {
            return Err(Error::Config(format!(
                "session.default_minutes must be between {} and {}, got {}",
                MIN_SESSION_MINUTES, MAX_SESSION_MINUTES, self.session.default_minutes
            )));
        }

        if let Some(bad) = self.session.presets.iter().find(|&&m| !in_range(m)) {
            return Err(Error::Config(format!(
                "session.presets contains out-of-range duration {}",
                bad
            )));
        }

        if get_default_catalog()
            .get(&self.session.default_technique)
            .is_none()
        {
            return Err(Error::Config(format!(
                "session.default_technique '{}' is not a known technique",
                self.session.default_technique
            )));
        }

        if self.storage.key_prefix.trim().is_empty() {
            return Err(Error::Config("storage.key_prefix must not be empty".into()));
        }

        Ok(())
    }

    /// Path of the key-value storage file
    pub fn storage_path(data_dir: &Path) -> PathBuf {
        data_dir.join("storage.json")
    }
}
