//! Entry point wiring the learning services together.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Config, PatternKey, PatternRecord, PatternSummary};
use crate::domain::ports::{CheckpointStore, PatternRepository, PredictionSource};
use crate::services::learning_pipeline::{LearningPipeline, RunReport};
use crate::services::pattern_store::PatternStore;
use crate::services::scheduler::{LastRunStatus, PatternScheduler, SchedulerHandle, SchedulerStatus, TriggerError};
use crate::services::summary::SummaryReporter;

/// Pattern learning engine.
///
/// Owns one store, pipeline and scheduler over the given adapters. Clones of
/// the scheduler share the same in-flight guard, so runs never overlap
/// whichever handle triggers them.
pub struct PatternEngine {
    store: Arc<PatternStore>,
    scheduler: PatternScheduler,
    reporter: SummaryReporter,
    interval: Duration,
}

impl PatternEngine {
    /// # Errors
    /// Returns `DomainError::ValidationFailed` if the scheduler interval is zero.
    pub fn new(
        repository: Arc<dyn PatternRepository>,
        source: Arc<dyn PredictionSource>,
        checkpoints: Arc<dyn CheckpointStore>,
        config: &Config,
    ) -> DomainResult<Self> {
        if config.scheduler.interval_minutes == 0 {
            return Err(DomainError::ValidationFailed(
                "scheduler.interval_minutes must be at least 1".to_string(),
            ));
        }

        let store = Arc::new(PatternStore::new(
            repository.clone(),
            config.learning.adjustment_policy(),
        ));
        let pipeline = Arc::new(LearningPipeline::new(
            source,
            checkpoints,
            store.clone(),
            config.learning.fetch_page_size,
        ));

        Ok(Self {
            store,
            scheduler: PatternScheduler::with_config(pipeline, &config.scheduler),
            reporter: SummaryReporter::new(repository),
            interval: Duration::from_secs(config.scheduler.interval_minutes.saturating_mul(60)),
        })
    }

    /// Run one learning pass now.
    pub async fn run_once(&self) -> Result<RunReport, TriggerError> {
        self.scheduler.run_once().await
    }

    /// Start periodic learning at the configured interval.
    pub fn start(&self) -> DomainResult<SchedulerHandle> {
        self.scheduler.start(self.interval)
    }

    pub fn scheduler(&self) -> &PatternScheduler {
        &self.scheduler
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn status(&self) -> SchedulerStatus {
        self.scheduler.status().await
    }

    /// Outcome of the most recent run, if any.
    pub async fn last_run_status(&self) -> Option<LastRunStatus> {
        self.scheduler.status().await.last_run
    }

    pub async fn get_summary(&self) -> DomainResult<PatternSummary> {
        self.reporter.summarize().await
    }

    pub async fn get_pattern(&self, key: &PatternKey) -> DomainResult<Option<PatternRecord>> {
        self.store.get_by_key(key).await
    }

    /// All patterns, most analyzed first.
    pub async fn list_patterns(&self) -> DomainResult<Vec<PatternRecord>> {
        let mut records = self.store.get_all().await?;
        records.sort_by(|a, b| b.sample_size.cmp(&a.sample_size).then_with(|| a.key.cmp(&b.key)));
        Ok(records)
    }
}
