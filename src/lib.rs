//! Prediction patterns - learns where human forecasters beat the AI
//!
//! Resolved market predictions are grouped into patterns (target type,
//! timeframe, human direction, and optionally market condition and sector).
//! For each pattern the engine keeps cumulative human and AI accuracy and
//! derives a bounded confidence adjustment the AI can apply to future
//! predictions in that context.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the storage/source ports
//! - **Adapters** (`adapters`): `SQLite`, JSON file and in-memory implementations of the ports
//! - **Service Layer** (`services`): aggregation, merging, scheduling and reporting
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use prediction_patterns::adapters::sqlite::initialize_database;
//! use prediction_patterns::cli::commands::engine_for_pool;
//! use prediction_patterns::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let pool = initialize_database(&config.database).await?;
//!     let engine = engine_for_pool(pool, &config)?;
//!     let report = engine.run_once().await?;
//!     println!("{} patterns updated", report.patterns_updated);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AdjustmentPolicy, BatchStat, Config, Direction, PatternKey, PatternRecord, PatternSummary,
    ResolvedPrediction, TargetType, Timeframe,
};
pub use domain::ports::{
    CheckpointStore, LearningCheckpoint, PatternRepository, PredictionCursor, PredictionPage,
    PredictionSource,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    PatternAggregator, PatternEngine, PatternScheduler, PatternStore, RunReport, SchedulerEvent,
    SummaryReporter, TriggerError,
};
