//! TOML-based application configuration.
//!
//! Stores operational settings:
//! - Default user for single-user installs
//! - Streak walk horizon
//! - Batch worker limits
//! - Notification toggle
//!
//! Configuration is stored at `~/.config/habitkit/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;

/// Streak calculation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Occurrences the backward walk inspects before saturating.
    #[serde(default = "default_horizon")]
    pub horizon: u32,
}

/// Batch worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Advisory per-user time limit; a user exceeding it is recorded as
    /// failed and the pass continues.
    #[serde(default)]
    pub per_user_timeout_secs: Option<u64>,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/habitkit/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_user")]
    pub default_user: String,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_user() -> String {
    "local".to_string()
}
fn default_horizon() -> u32 {
    120
}
fn default_true() -> bool {
    true
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            per_user_timeout_secs: None,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_user: default_user(),
            streak: StreakConfig::default(),
            batch: BatchConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_user, "local");
        assert_eq!(parsed.streak.horizon, 120);
        assert_eq!(parsed.batch.per_user_timeout_secs, None);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("default_user = \"alice\"\n").unwrap();
        assert_eq!(parsed.default_user, "alice");
        assert_eq!(parsed.streak.horizon, 120);
    }

    #[test]
    fn partial_sections_parse() {
        let parsed: Config = toml::from_str(
            "[batch]\nper_user_timeout_secs = 30\n\n[notifications]\nenabled = false\n",
        )
        .unwrap();
        assert_eq!(parsed.batch.per_user_timeout_secs, Some(30));
        assert!(!parsed.notifications.enabled);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.default_user = "bob".to_string();
        cfg.streak.horizon = 60;

        std::fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();
        let parsed: Config =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.default_user, "bob");
        assert_eq!(parsed.streak.horizon, 60);
    }
}
