use serde::{Deserialize, Serialize};

use super::pattern::AdjustmentPolicy;

/// Main configuration structure for the pattern engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pattern learning configuration
    #[serde(default)]
    pub learning: LearningConfig,

    /// Background scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".patterns/patterns.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// `SQLite` connection URL for the configured path
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            retention_days: default_retention_days(),
        }
    }
}

/// Pattern learning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LearningConfig {
    /// Multiplier applied to the human-minus-AI accuracy gap (in points)
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    /// Absolute bound on the confidence adjustment, in percentage points
    #[serde(default = "default_max_adjustment")]
    pub max_adjustment: f64,

    /// Number of predictions fetched per page during a run
    #[serde(default = "default_fetch_page_size")]
    pub fetch_page_size: u32,
}

const fn default_sensitivity() -> f64 {
    0.5
}

const fn default_max_adjustment() -> f64 {
    20.0
}

const fn default_fetch_page_size() -> u32 {
    500
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            max_adjustment: default_max_adjustment(),
            fetch_page_size: default_fetch_page_size(),
        }
    }
}

impl LearningConfig {
    pub const fn adjustment_policy(&self) -> AdjustmentPolicy {
        AdjustmentPolicy {
            sensitivity: self.sensitivity,
            max_adjustment: self.max_adjustment,
        }
    }
}

/// Background scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Minutes between aggregation runs
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Whether to run immediately when the scheduler starts
    #[serde(default = "default_run_on_startup")]
    pub run_on_startup: bool,
}

const fn default_interval_minutes() -> u64 {
    60
}

const fn default_run_on_startup() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            run_on_startup: default_run_on_startup(),
        }
    }
}
