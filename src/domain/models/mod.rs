pub mod config;
pub mod pattern;
pub mod prediction;

pub use config::{Config, DatabaseConfig, LearningConfig, LoggingConfig, SchedulerConfig};
pub use pattern::{AdjustmentPolicy, BatchStat, PatternKey, PatternRecord, PatternSummary};
pub use prediction::{Direction, Outcome, ResolvedPrediction, TargetType, Timeframe};
