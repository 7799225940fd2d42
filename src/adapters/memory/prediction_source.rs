//! In-memory prediction source.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ResolvedPrediction;
use crate::domain::ports::{PredictionCursor, PredictionPage, PredictionSource};

/// Serves already-normalized predictions in the order they were added.
///
/// Adding a prediction plays the role of the host resolving it, so the
/// position of a prediction is its arrival index.
#[derive(Debug, Default)]
pub struct InMemoryPredictionSource {
    predictions: RwLock<Vec<ResolvedPrediction>>,
}

impl InMemoryPredictionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_predictions(predictions: Vec<ResolvedPrediction>) -> Self {
        Self {
            predictions: RwLock::new(predictions),
        }
    }

    pub async fn push(&self, prediction: ResolvedPrediction) {
        self.predictions.write().await.push(prediction);
    }
}

fn start_index(since: Option<&PredictionCursor>) -> DomainResult<usize> {
    match since {
        None => Ok(0),
        Some(cursor) => cursor
            .position
            .parse::<usize>()
            .map(|index| index + 1)
            .map_err(|_| DomainError::InputFetch(format!("invalid cursor position '{}'", cursor.position))),
    }
}

#[async_trait]
impl PredictionSource for InMemoryPredictionSource {
    async fn fetch_resolved(
        &self,
        since: Option<&PredictionCursor>,
        limit: u32,
    ) -> DomainResult<PredictionPage> {
        let start = start_index(since)?;
        let predictions = self.predictions.read().await;
        let end = predictions.len().min(start.saturating_add(limit as usize));
        let page: Vec<ResolvedPrediction> = predictions.get(start..end).unwrap_or_default().to_vec();

        Ok(PredictionPage {
            next_cursor: page.last().map(|last| PredictionCursor {
                position: (start + page.len() - 1).to_string(),
                id: last.id.clone(),
            }),
            predictions: page,
            rejected: Vec::new(),
        })
    }
}
