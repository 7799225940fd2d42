//! Prediction source backed by a JSON export from the host application.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::adapters::ingestion::{normalize, RawPrediction};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{PredictionCursor, PredictionPage, PredictionSource};

/// Reads a JSON array of host prediction records on every fetch.
///
/// A file carries no history of when records changed, so resolved records
/// are ordered by their canonical `resolved_at`, falling back to `created_at`.
/// Exports that resolve predictions out of creation order must include
/// `resolved_at`; the `import` command loads the same files into `SQLite`,
/// which tracks resolution order itself.
#[derive(Debug, Clone)]
pub struct JsonFilePredictionSource {
    path: PathBuf,
}

impl JsonFilePredictionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record in the file, resolved or not.
    pub async fn load_all(&self) -> DomainResult<Vec<RawPrediction>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| DomainError::InputFetch(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| DomainError::InputFetch(format!("{}: {e}", self.path.display())))
    }
}

#[async_trait]
impl PredictionSource for JsonFilePredictionSource {
    async fn fetch_resolved(
        &self,
        since: Option<&PredictionCursor>,
        limit: u32,
    ) -> DomainResult<PredictionPage> {
        let mut pending: Vec<(String, String, RawPrediction)> = self
            .load_all()
            .await?
            .into_iter()
            .filter(RawPrediction::is_resolved)
            .map(|raw| (raw.resolution_position(), raw.id.clone().unwrap_or_default(), raw))
            .filter(|(position, id, _)| {
                since.map_or(true, |c| (position.as_str(), id.as_str()) > (c.position.as_str(), c.id.as_str()))
            })
            .collect();
        pending.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        pending.truncate(limit as usize);

        let mut page = PredictionPage {
            next_cursor: pending.last().map(|(position, id, _)| PredictionCursor {
                position: position.clone(),
                id: id.clone(),
            }),
            ..PredictionPage::default()
        };
        for (_, _, raw) in pending {
            match normalize(raw) {
                Ok(prediction) => page.predictions.push(prediction),
                Err(err) => page.rejected.push(err),
            }
        }
        Ok(page)
    }
}
