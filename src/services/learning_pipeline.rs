//! One learning run: fetch newly resolved predictions, aggregate, merge.
//!
//! Predictions are pulled page by page from the last checkpoint and folded,
//! together with any deferred stats, into a single batch, so the store sees
//! one merge per run. The next checkpoint (cursor plus whatever the merge
//! deferred) is saved only after the merge, and a run that fails while
//! fetching writes nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{CheckpointStore, LearningCheckpoint, PredictionSource};
use crate::services::aggregator::Aggregation;
use crate::services::pattern_store::PatternStore;

/// Outcome of a successful learning run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Source records read this run, malformed ones included.
    pub predictions_fetched: usize,
    /// Predictions folded into some pattern.
    pub predictions_aggregated: u64,
    /// Predictions without a pattern key.
    pub predictions_filtered: usize,
    /// Malformed records skipped.
    pub skipped: usize,
    pub patterns_created: usize,
    pub patterns_updated: usize,
    /// Keys whose contribution waits for the next run.
    pub deferred: usize,
    /// Samples held in those deferred contributions.
    pub deferred_samples: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct LearningPipeline {
    source: Arc<dyn PredictionSource>,
    checkpoints: Arc<dyn CheckpointStore>,
    store: Arc<PatternStore>,
    page_size: u32,
    /// Checkpoint after merged predictions that has not been saved yet.
    unsaved: Mutex<Option<LearningCheckpoint>>,
}

impl LearningPipeline {
    pub fn new(
        source: Arc<dyn PredictionSource>,
        checkpoints: Arc<dyn CheckpointStore>,
        store: Arc<PatternStore>,
        page_size: u32,
    ) -> Self {
        Self {
            source,
            checkpoints,
            store,
            page_size: page_size.max(1),
            unsaved: Mutex::new(None),
        }
    }

    /// Execute one run.
    pub async fn run(&self) -> DomainResult<RunReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mut unsaved = self.unsaved.lock().await;
        let previous = match unsaved.clone() {
            Some(checkpoint) => checkpoint,
            None => self.checkpoints.load().await?,
        };

        let mut cursor = previous.cursor.clone();
        let mut aggregation = Aggregation::default();
        let mut fetched = 0usize;
        let mut skipped = 0usize;
        loop {
            let page = self.source.fetch_resolved(cursor.as_ref(), self.page_size).await?;
            let page_len = page.len();

            for rejected in &page.rejected {
                warn!(%run_id, error = %rejected, "Skipping malformed prediction");
            }
            skipped += page.rejected.len();
            fetched += page_len;
            aggregation.absorb(&page.predictions);
            if page.next_cursor.is_some() {
                cursor = page.next_cursor;
            }

            if page_len < self.page_size as usize {
                break;
            }
            // Large backlogs are processed a page at a time without hogging the worker.
            tokio::task::yield_now().await;
        }

        let predictions_aggregated = aggregation.grouped();
        let predictions_filtered = aggregation.filtered;

        let mut batch = previous.deferred.clone();
        if !batch.is_empty() {
            info!(%run_id, keys = batch.len(), samples = previous.deferred_samples(), "Retrying deferred pattern stats");
        }
        for (key, stat) in aggregation.stats {
            batch.entry(key).or_default().combine(&stat);
        }
        let merge = self.store.merge_batch(batch).await;

        let next = LearningCheckpoint {
            cursor,
            deferred: merge.deferred.clone(),
        };
        if next != previous {
            *unsaved = Some(next.clone());
            self.checkpoints.save(&next).await?;
            *unsaved = None;
        }

        if let Some(error) = merge.storage_error {
            return Err(DomainError::DatabaseError(error));
        }

        let report = RunReport {
            run_id,
            predictions_fetched: fetched,
            predictions_aggregated,
            predictions_filtered,
            skipped,
            patterns_created: merge.created.len(),
            patterns_updated: merge.patterns_updated(),
            deferred: next.deferred.len(),
            deferred_samples: next.deferred_samples(),
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            %run_id,
            fetched = report.predictions_fetched,
            aggregated = report.predictions_aggregated,
            filtered = report.predictions_filtered,
            skipped = report.skipped,
            patterns_updated = report.patterns_updated,
            deferred = report.deferred,
            "Learning run completed"
        );

        Ok(report)
    }
}
