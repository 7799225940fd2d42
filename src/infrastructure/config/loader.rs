use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding project-local configuration and data.
pub const CONFIG_DIR: &str = ".patterns";

/// Prefix for environment overrides, e.g. `PATTERNS_LEARNING__SENSITIVITY`.
pub const ENV_PREFIX: &str = "PATTERNS_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid sensitivity: {0}. Must be a positive number")]
    InvalidSensitivity(f64),

    #[error("Invalid max_adjustment: {0}. Must be a positive number")]
    InvalidMaxAdjustment(f64),

    #[error("Invalid fetch_page_size: {0}. Must be at least 1")]
    InvalidPageSize(u32),

    #[error("Invalid interval_minutes: {0}. Must be at least 1")]
    InvalidInterval(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .patterns/config.yaml (project config, created by init)
    /// 3. .patterns/local.yaml (project local overrides, optional)
    /// 4. Environment variables (PATTERNS_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(CONFIG_DIR)
    }

    /// Load with the project files taken from `dir` instead of `.patterns/`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let learning = &config.learning;
        if !learning.sensitivity.is_finite() || learning.sensitivity <= 0.0 {
            return Err(ConfigError::InvalidSensitivity(learning.sensitivity));
        }

        if !learning.max_adjustment.is_finite() || learning.max_adjustment <= 0.0 {
            return Err(ConfigError::InvalidMaxAdjustment(learning.max_adjustment));
        }

        if learning.fetch_page_size == 0 {
            return Err(ConfigError::InvalidPageSize(learning.fetch_page_size));
        }

        if config.scheduler.interval_minutes == 0 {
            return Err(ConfigError::InvalidInterval(config.scheduler.interval_minutes));
        }

        Ok(())
    }

    /// Default project config written by `init`.
    pub fn default_yaml() -> Result<String> {
        serde_yaml::to_string(&Config::default()).context("Failed to serialize default configuration")
    }
}
