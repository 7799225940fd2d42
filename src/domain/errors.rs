//! Domain errors for the prediction pattern engine.

use thiserror::Error;

/// Domain-level errors that can occur while learning prediction patterns.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The external prediction store could not be read.
    #[error("Failed to fetch predictions: {0}")]
    InputFetch(String),

    /// A prediction claiming to be resolved is missing data needed to score it.
    #[error("Malformed prediction {id}: {reason}")]
    MalformedPrediction { id: String, reason: String },

    /// An optimistic write lost a race against another writer.
    #[error("Concurrency conflict: {entity} {id} was modified")]
    ConcurrencyConflict { entity: String, id: String },

    /// A learning run stopped before producing a result.
    #[error("Learning run aborted: {0}")]
    RunAborted(String),

    #[error("Pattern not found: {0}")]
    PatternNotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Whether this error is a lost optimistic-concurrency race.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
