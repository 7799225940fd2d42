//! Application services: aggregation, merging, scheduling and reporting.

pub mod aggregator;
pub mod engine;
pub mod learning_pipeline;
pub mod pattern_store;
pub mod scheduler;
pub mod summary;

pub use aggregator::{Aggregation, PatternAggregator};
pub use engine::PatternEngine;
pub use learning_pipeline::{LearningPipeline, RunReport};
pub use pattern_store::{MergeReport, PatternStore};
pub use scheduler::{
    LastRunStatus, PatternScheduler, RunTrigger, SchedulerEvent, SchedulerHandle, SchedulerStatus,
    TriggerError,
};
pub use summary::{summarize_records, SummaryReporter};
