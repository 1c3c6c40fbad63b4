//! Configuration for the Monet runtime
//!
//! Handles loading, validating and merging runtime configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use monet_cache::CacheConfig;
use monet_core::LogLevel;

/// Errors that can occur in configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for monet_core::Error {
    fn from(err: ConfigError) -> Self {
        monet_core::Error::Config(err.to_string())
    }
}

/// Where cached detection results are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// In-process only, lost on exit
    #[default]
    Memory,

    /// One file per key under `cache.directory`
    File,

    /// No backend; the cache is a no-op
    None,
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Whether detection results are cached
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Storage backend
    #[serde(default)]
    pub backend: StorageKind,

    /// Directory for the `file` backend
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Prefix of every storage key the cache writes
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_enabled() -> bool {
    true
}

fn default_key_prefix() -> String {
    CacheConfig::default().key_prefix
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: StorageKind::default(),
            directory: None,
            key_prefix: default_key_prefix(),
        }
    }
}

impl CacheSettings {
    /// The subset of settings the result cache itself consumes
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            enabled: self.enabled,
            key_prefix: self.key_prefix.clone(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level, overridden by `RUST_LOG`
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

/// Runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RuntimeConfig {
    /// Load configuration from a file.
    ///
    /// Files ending in `.toml` are parsed as TOML, anything else as JSON. A
    /// missing path or a missing file yields the defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = RuntimeConfig::default();

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());

            if !path.exists() {
                warn!("Configuration file not found: {}", path.display());
                return Ok(config);
            }

            let content = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

            config = Self::parse(path, &content)
                .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;
        } else {
            info!("No configuration file specified, using defaults");
        }

        config.validate()?;

        Ok(config)
    }

    fn parse(path: &Path, content: &str) -> std::result::Result<Self, ConfigError> {
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
        } else {
            serde_json::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.cache.key_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "Cache key prefix cannot be empty".to_string(),
            ));
        }

        if self.cache.backend == StorageKind::File && self.cache.directory.is_none() {
            return Err(ConfigError::Invalid(
                "The file cache backend requires cache.directory".to_string(),
            ));
        }

        if !self.cache.enabled && self.cache.backend != StorageKind::None {
            info!("Cache is disabled; the configured backend will not be used");
        }

        Ok(())
    }

    /// Merge with another configuration.
    ///
    /// Values in `other` that differ from the defaults win.
    pub fn merge(&mut self, other: RuntimeConfig) {
        let defaults = RuntimeConfig::default();

        // Merge cache
        if other.cache.enabled != defaults.cache.enabled {
            self.cache.enabled = other.cache.enabled;
        }
        if other.cache.backend != defaults.cache.backend {
            self.cache.backend = other.cache.backend;
        }
        if other.cache.directory.is_some() {
            self.cache.directory = other.cache.directory;
        }
        if other.cache.key_prefix != defaults.cache.key_prefix && !other.cache.key_prefix.is_empty()
        {
            self.cache.key_prefix = other.cache.key_prefix;
        }

        // Merge logging
        if other.logging.level != defaults.logging.level {
            self.logging.level = other.logging.level;
        }
        if other.logging.json {
            self.logging.json = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_json_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monet.json");

        let config_json = r#"
        {
            "cache": {
                "backend": "file",
                "directory": "/tmp/monet-cache",
                "key_prefix": "site/"
            },
            "logging": { "level": "debug", "json": true }
        }
        "#;
        fs::write(&path, config_json).await.unwrap();

        let config = RuntimeConfig::load(Some(&path)).await.unwrap();

        assert!(config.cache.enabled);
        assert_eq!(config.cache.backend, StorageKind::File);
        assert_eq!(
            config.cache.directory,
            Some(PathBuf::from("/tmp/monet-cache"))
        );
        assert_eq!(config.cache.key_prefix, "site/");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.json);
    }

    #[tokio::test]
    async fn test_load_toml_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monet.toml");

        let config_toml = r#"
[cache]
enabled = false
backend = "none"

[logging]
level = "warning"
"#;
        fs::write(&path, config_toml).await.unwrap();

        let config = RuntimeConfig::load(Some(&path)).await.unwrap();

        assert!(!config.cache.enabled);
        assert_eq!(config.cache.backend, StorageKind::None);
        assert_eq!(config.cache.key_prefix, "monetization/");
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[tokio::test]
    async fn test_default_config() {
        let config = RuntimeConfig::load(None).await.unwrap();

        assert!(config.cache.enabled);
        assert_eq!(config.cache.backend, StorageKind::Memory);
        assert_eq!(config.cache.key_prefix, "monetization/");
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(!config.logging.json);
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");

        let config = RuntimeConfig::load(Some(&path)).await.unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let dir = TempDir::new().unwrap();

        let path = dir.path().join("file-backend.json");
        fs::write(&path, r#"{ "cache": { "backend": "file" } }"#)
            .await
            .unwrap();
        assert!(RuntimeConfig::load(Some(&path)).await.is_err());

        let path = dir.path().join("bad-level.json");
        fs::write(&path, r#"{ "logging": { "level": "loud" } }"#)
            .await
            .unwrap();
        assert!(RuntimeConfig::load(Some(&path)).await.is_err());

        let path = dir.path().join("empty-prefix.toml");
        fs::write(&path, "[cache]\nkey_prefix = \"\"\n").await.unwrap();
        assert!(RuntimeConfig::load(Some(&path)).await.is_err());
    }

    #[test]
    fn test_merge_config() {
        let mut base = RuntimeConfig::default();
        base.cache.key_prefix = "base/".to_string();

        let mut override_config = RuntimeConfig::default();
        override_config.cache.backend = StorageKind::File;
        override_config.cache.directory = Some(PathBuf::from("/var/cache/monet"));
        override_config.logging.level = LogLevel::Trace;

        base.merge(override_config);

        assert_eq!(base.cache.backend, StorageKind::File);
        assert_eq!(base.cache.directory, Some(PathBuf::from("/var/cache/monet")));
        assert_eq!(base.cache.key_prefix, "base/");
        assert_eq!(base.logging.level, LogLevel::Trace);
        assert!(base.validate().is_ok());
    }
}
