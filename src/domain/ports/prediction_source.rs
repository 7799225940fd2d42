//! Port over the host application's resolved predictions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ResolvedPrediction;

/// Position in a source's resolution ordering.
///
/// Each source orders predictions by when it learned they resolved, never by
/// when they were made, so a long-horizon prediction that resolves late is
/// still picked up. `position` is opaque to the engine: only the source that
/// produced a cursor compares it, with `id` breaking ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionCursor {
    pub position: String,
    pub id: String,
}

/// One page of resolved predictions.
#[derive(Debug, Default)]
pub struct PredictionPage {
    /// Normalized predictions, in source order.
    pub predictions: Vec<ResolvedPrediction>,
    /// Records that claimed to be resolved but could not be normalized.
    pub rejected: Vec<DomainError>,
    /// Position after the last record of this page, rejected ones included.
    pub next_cursor: Option<PredictionCursor>,
}

impl PredictionPage {
    /// Number of source records this page covered.
    pub fn len(&self) -> usize {
        self.predictions.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
pub trait PredictionSource: Send + Sync {
    /// Fetch up to `limit` completed predictions strictly after `since`.
    ///
    /// Unreachable stores must be reported as `DomainError::InputFetch`.
    async fn fetch_resolved(
        &self,
        since: Option<&PredictionCursor>,
        limit: u32,
    ) -> DomainResult<PredictionPage>;
}
