//! File-based configuration for the `tinstore` binary.

use crate::apps::AUTH_STORAGE_KEY;
use crate::middleware::validate_key;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for persisted stores. Defaults to the platform data dir.
    pub storage_dir: Option<PathBuf>,
    pub devtools: DevtoolsConfig,
    pub persist: PersistConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevtoolsConfig {
    pub enabled: bool,
    pub name: String,
}

impl Default for DevtoolsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "counter".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    pub key: String,
    pub version: u32,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            key: AUTH_STORAGE_KEY.to_string(),
            version: 0,
        }
    }
}

impl Config {
    /// `~/.config/tinstore/config.toml` or the platform equivalent.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("tinstore").join("config.toml")
    }

    /// Load from the default path; a missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load_from(&path)
    }

    /// Load and validate the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks:
    /// - `persist.key` is usable as a storage key (non-empty, no path parts)
    /// - `devtools.name` is not blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(err) = validate_key(&self.persist.key) {
            return Err(ConfigError::ValidationError {
                message: format!("persist.key: {err}"),
            });
        }
        if self.devtools.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "devtools.name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Configured storage directory, else `<data dir>/tinstore`.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tinstore")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_demo_apps() {
        let config = Config::default();
        assert!(config.devtools.enabled);
        assert_eq!(config.persist.key, "auth-storage");
        assert_eq!(config.persist.version, 0);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "storage_dir = \"/tmp/state\"\n[devtools]\nenabled = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.storage_dir(), PathBuf::from("/tmp/state"));
        assert!(!config.devtools.enabled);
        assert_eq!(config.devtools.name, "counter");
        assert_eq!(config.persist, PersistConfig::default());
    }

    #[test]
    fn empty_key_fails_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[persist]\nkey = \"\"\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn path_like_key_fails_validation() {
        for key in ["a/b", "../x", "a\\b"] {
            let mut config = Config::default();
            config.persist.key = key.to_string();

            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError { .. })),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[devtools\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
