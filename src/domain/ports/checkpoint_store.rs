//! Port for durable learning progress.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{BatchStat, PatternKey};
use crate::domain::ports::prediction_source::PredictionCursor;

/// Where learning left off.
///
/// The cursor and the deferred stats describe the same moment: predictions
/// up to `cursor` are either merged into patterns or held in `deferred`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearningCheckpoint {
    /// Last prediction consumed from the source.
    pub cursor: Option<PredictionCursor>,
    /// Contributions that could not be written yet, folded into the next run.
    pub deferred: BTreeMap<PatternKey, BatchStat>,
}

impl LearningCheckpoint {
    /// Samples waiting in deferred stats.
    pub fn deferred_samples(&self) -> u64 {
        self.deferred.values().map(|stat| stat.total).sum()
    }
}

/// Persists the learning checkpoint, so a prediction is never aggregated
/// twice and a deferred contribution survives a restart.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the last saved checkpoint; empty if none was ever saved.
    async fn load(&self) -> DomainResult<LearningCheckpoint>;

    /// Replace the checkpoint atomically.
    async fn save(&self, checkpoint: &LearningCheckpoint) -> DomainResult<()>;
}
