//! Repository port for pattern persistence.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{PatternKey, PatternRecord};

/// Storage for pattern records, at most one per key.
///
/// Writes are optimistic: implementations must make `insert` and `update`
/// atomic with respect to other writers and report a lost race as
/// `DomainError::ConcurrencyConflict` instead of overwriting.
#[async_trait]
pub trait PatternRepository: Send + Sync {
    /// Get the record for a key.
    async fn get(&self, key: &PatternKey) -> DomainResult<Option<PatternRecord>>;

    /// List every stored record.
    async fn list(&self) -> DomainResult<Vec<PatternRecord>>;

    /// Insert a record for a key that has none yet.
    ///
    /// Returns the stored record with its initial version. Fails with a
    /// conflict if a record for the key already exists.
    async fn insert(&self, record: &PatternRecord) -> DomainResult<PatternRecord>;

    /// Replace a record, provided its stored version still equals `record.version`.
    ///
    /// Returns the stored record with its bumped version.
    async fn update(&self, record: &PatternRecord) -> DomainResult<PatternRecord>;
}
