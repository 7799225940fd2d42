//! Merges batch statistics into persisted pattern records.
//!
//! Merges are serialized within the process. Each key is written with an
//! optimistic compare-and-swap; a key that loses the race twice, or whose
//! write fails, is handed back in the report's deferred stats so the caller
//! can persist it and fold it into the next batch instead of dropping it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{AdjustmentPolicy, BatchStat, PatternKey, PatternRecord};
use crate::domain::ports::PatternRepository;

/// Attempts per key before its contribution is deferred.
const MAX_WRITE_ATTEMPTS: usize = 2;

/// Result of merging one batch.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub created: Vec<PatternKey>,
    pub updated: Vec<PatternKey>,
    /// Contributions not written, to be merged again later.
    pub deferred: BTreeMap<PatternKey, BatchStat>,
    /// First storage failure, if any. Keys from that point on were deferred.
    pub storage_error: Option<String>,
}

impl MergeReport {
    /// Number of pattern records written.
    pub fn patterns_updated(&self) -> usize {
        self.created.len() + self.updated.len()
    }
}

enum KeyOutcome {
    Created,
    Updated,
    Conflicted,
}

pub struct PatternStore {
    repository: Arc<dyn PatternRepository>,
    policy: AdjustmentPolicy,
    merge_lock: Mutex<()>,
}

impl PatternStore {
    pub fn new(repository: Arc<dyn PatternRepository>, policy: AdjustmentPolicy) -> Self {
        Self {
            repository,
            policy,
            merge_lock: Mutex::new(()),
        }
    }

    /// Merge a batch into the stored patterns.
    ///
    /// Callers pass previously deferred stats back in as part of `batch`.
    pub async fn merge_batch(&self, batch: BTreeMap<PatternKey, BatchStat>) -> MergeReport {
        let _merging = self.merge_lock.lock().await;

        let mut report = MergeReport::default();
        for (key, stat) in batch {
            if stat.total == 0 {
                continue;
            }
            if report.storage_error.is_some() {
                report.deferred.insert(key, stat);
                continue;
            }
            match self.merge_key(&key, &stat).await {
                Ok(KeyOutcome::Created) => report.created.push(key),
                Ok(KeyOutcome::Updated) => report.updated.push(key),
                Ok(KeyOutcome::Conflicted) => {
                    warn!(pattern = %key, samples = stat.total, "Pattern write conflicted twice, deferring to next run");
                    report.deferred.insert(key, stat);
                }
                Err(err) => {
                    warn!(pattern = %key, error = %err, "Pattern write failed, deferring remaining keys");
                    report.storage_error = Some(err.to_string());
                    report.deferred.insert(key, stat);
                }
            }
        }

        report
    }

    async fn merge_key(&self, key: &PatternKey, stat: &BatchStat) -> DomainResult<KeyOutcome> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let now = Utc::now();
            let result = match self.repository.get(key).await? {
                None => self
                    .repository
                    .insert(&PatternRecord::from_batch(key.clone(), stat, &self.policy, now))
                    .await
                    .map(|record| (KeyOutcome::Created, record)),
                Some(existing) => self
                    .repository
                    .update(&existing.merged(stat, &self.policy, now))
                    .await
                    .map(|record| (KeyOutcome::Updated, record)),
            };

            match result {
                Ok((outcome, record)) => {
                    debug!(
                        pattern = %key,
                        sample_size = record.sample_size,
                        adjustment = record.confidence_adjustment,
                        "Merged pattern"
                    );
                    return Ok(outcome);
                }
                Err(err) if err.is_conflict() => {
                    debug!(pattern = %key, attempt, "Pattern write conflicted, re-reading");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(KeyOutcome::Conflicted)
    }

    pub async fn get_all(&self) -> DomainResult<Vec<PatternRecord>> {
        self.repository.list().await
    }

    pub async fn get_by_key(&self, key: &PatternKey) -> DomainResult<Option<PatternRecord>> {
        self.repository.get(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPatternRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::models::{Direction, TargetType, Timeframe};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key() -> PatternKey {
        PatternKey::new(TargetType::Stock, Timeframe::OneDay, Direction::Bullish)
    }

    fn stat(human_correct: u64, ai_correct: u64, total: u64) -> BatchStat {
        BatchStat {
            human_correct,
            ai_correct,
            total,
            mean_ai_confidence: 70.0,
        }
    }

    fn batch(entries: &[(PatternKey, BatchStat)]) -> BTreeMap<PatternKey, BatchStat> {
        entries.iter().cloned().collect()
    }

    fn store() -> PatternStore {
        PatternStore::new(Arc::new(InMemoryPatternRepository::new()), AdjustmentPolicy::default())
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let repo = Arc::new(InMemoryPatternRepository::new());
        let store = PatternStore::new(repo.clone(), AdjustmentPolicy::default());

        let report = store.merge_batch(BTreeMap::new()).await;

        assert_eq!(report.patterns_updated(), 0);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_first_merge_creates_record() {
        let store = store();
        let report = store.merge_batch(batch(&[(key(), stat(6, 4, 10))])).await;
        assert_eq!(report.created, vec![key()]);

        let record = store.get_by_key(&key()).await.unwrap().unwrap();
        assert_eq!(record.sample_size, 10);
        assert!((record.human_accuracy - 0.6).abs() < 1e-12);
        assert!((record.ai_accuracy - 0.4).abs() < 1e-12);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn test_sequential_merges_match_single_batch() {
        let store = store();
        store.merge_batch(batch(&[(key(), stat(6, 5, 10))])).await;
        let report = store.merge_batch(batch(&[(key(), stat(2, 1, 5))])).await;
        assert_eq!(report.updated, vec![key()]);

        let record = store.get_by_key(&key()).await.unwrap().unwrap();
        assert_eq!(record.sample_size, 15);
        assert!((record.human_accuracy - 8.0 / 15.0).abs() < 1e-12);
        assert!((record.ai_accuracy - 6.0 / 15.0).abs() < 1e-12);
        assert!(record.updated_at >= record.created_at);
    }

    #[tokio::test]
    async fn test_merging_same_batch_twice_is_additive() {
        let store = store();
        let b = batch(&[(key(), stat(3, 1, 4))]);
        store.merge_batch(b.clone()).await;
        store.merge_batch(b).await;

        let record = store.get_by_key(&key()).await.unwrap().unwrap();
        assert_eq!(record.sample_size, 8);
        assert_eq!(record.human_correct_count, 6);
        assert!((record.human_accuracy - 0.75).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_adjustment_clamped_on_extreme_gap() {
        let store = store();
        store.merge_batch(batch(&[(key(), stat(50, 0, 50))])).await;

        let record = store.get_by_key(&key()).await.unwrap().unwrap();
        assert!((record.human_accuracy - 1.0).abs() < f64::EPSILON);
        assert!(record.ai_accuracy.abs() < f64::EPSILON);
        assert!((record.confidence_adjustment - 20.0).abs() < f64::EPSILON);
    }

    /// Repository whose writes conflict a configurable number of times.
    struct ConflictingRepository {
        inner: InMemoryPatternRepository,
        conflicts_left: AtomicUsize,
    }

    impl ConflictingRepository {
        fn new(conflicts: usize) -> Self {
            Self {
                inner: InMemoryPatternRepository::new(),
                conflicts_left: AtomicUsize::new(conflicts),
            }
        }

        fn maybe_conflict(&self, key: &PatternKey) -> DomainResult<()> {
            let left = self.conflicts_left.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts_left.store(left - 1, Ordering::SeqCst);
                return Err(DomainError::ConcurrencyConflict {
                    entity: "pattern".to_string(),
                    id: key.storage_key(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PatternRepository for ConflictingRepository {
        async fn get(&self, key: &PatternKey) -> DomainResult<Option<PatternRecord>> {
            self.inner.get(key).await
        }

        async fn list(&self) -> DomainResult<Vec<PatternRecord>> {
            self.inner.list().await
        }

        async fn insert(&self, record: &PatternRecord) -> DomainResult<PatternRecord> {
            self.maybe_conflict(&record.key)?;
            self.inner.insert(record).await
        }

        async fn update(&self, record: &PatternRecord) -> DomainResult<PatternRecord> {
            self.maybe_conflict(&record.key)?;
            self.inner.update(record).await
        }
    }

    #[tokio::test]
    async fn test_single_conflict_is_retried() {
        let store = PatternStore::new(Arc::new(ConflictingRepository::new(1)), AdjustmentPolicy::default());

        let report = store.merge_batch(batch(&[(key(), stat(1, 1, 2))])).await;

        assert_eq!(report.created, vec![key()]);
        assert!(report.deferred.is_empty());
        assert_eq!(store.get_by_key(&key()).await.unwrap().unwrap().sample_size, 2);
    }

    #[tokio::test]
    async fn test_repeated_conflict_defers_contribution() {
        let store = PatternStore::new(Arc::new(ConflictingRepository::new(2)), AdjustmentPolicy::default());

        let report = store.merge_batch(batch(&[(key(), stat(1, 1, 2))])).await;
        assert!(report.created.is_empty());
        assert!(report.storage_error.is_none());
        assert_eq!(report.deferred.get(&key()), Some(&stat(1, 1, 2)));
        assert!(store.get_by_key(&key()).await.unwrap().is_none());

        // Handed back with the next batch, the deferred stats are merged.
        let mut next = report.deferred;
        next.entry(key()).or_default().combine(&stat(3, 0, 3));
        let report = store.merge_batch(next).await;
        assert_eq!(report.created, vec![key()]);
        assert!(report.deferred.is_empty());

        let record = store.get_by_key(&key()).await.unwrap().unwrap();
        assert_eq!(record.sample_size, 5);
        assert_eq!(record.human_correct_count, 4);
    }

    /// Repository whose writes always fail.
    struct BrokenRepository;

    #[async_trait]
    impl PatternRepository for BrokenRepository {
        async fn get(&self, _key: &PatternKey) -> DomainResult<Option<PatternRecord>> {
            Ok(None)
        }

        async fn list(&self) -> DomainResult<Vec<PatternRecord>> {
            Ok(Vec::new())
        }

        async fn insert(&self, _record: &PatternRecord) -> DomainResult<PatternRecord> {
            Err(DomainError::DatabaseError("disk I/O error".to_string()))
        }

        async fn update(&self, _record: &PatternRecord) -> DomainResult<PatternRecord> {
            Err(DomainError::DatabaseError("disk I/O error".to_string()))
        }
    }

    #[tokio::test]
    async fn test_storage_failure_defers_remaining_keys() {
        let store = PatternStore::new(Arc::new(BrokenRepository), AdjustmentPolicy::default());
        let other = PatternKey::new(TargetType::Market, Timeframe::OneMonth, Direction::Neutral);

        let report = store.merge_batch(batch(&[(key(), stat(1, 0, 1)), (other.clone(), stat(0, 2, 2))])).await;

        assert!(report.storage_error.unwrap().contains("disk I/O error"));
        assert_eq!(report.deferred.len(), 2);
        assert_eq!(report.deferred.values().map(|s| s.total).sum::<u64>(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_stores_never_lose_samples() {
        let repository = Arc::new(InMemoryPatternRepository::new());
        let stores: Vec<Arc<PatternStore>> = (0..2)
            .map(|_| Arc::new(PatternStore::new(repository.clone(), AdjustmentPolicy::default())))
            .collect();

        let mut tasks = Vec::new();
        for (i, store) in stores.iter().enumerate() {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let mut carried = BTreeMap::new();
                for round in 0..50u64 {
                    let mut work: BTreeMap<PatternKey, BatchStat> = std::mem::take(&mut carried);
                    let correct = (round + i as u64) % 3;
                    work.entry(key()).or_default().combine(&stat(correct, 1, 3));
                    carried = store.merge_batch(work).await.deferred;
                    tokio::task::yield_now().await;
                }
                carried.values().map(|s| s.total).sum::<u64>()
            }));
        }

        let mut still_deferred = 0;
        for task in tasks {
            still_deferred += task.await.unwrap();
        }

        let stored = repository.get(&key()).await.unwrap().map_or(0, |r| r.sample_size);
        assert_eq!(stored + still_deferred, 2 * 50 * 3);
    }

    #[tokio::test]
    async fn test_zero_total_entries_are_ignored() {
        let repo = Arc::new(InMemoryPatternRepository::new());
        let store = PatternStore::new(repo.clone(), AdjustmentPolicy::default());

        let report = store.merge_batch(batch(&[(key(), BatchStat::default())])).await;
        assert_eq!(report.patterns_updated(), 0);
        assert!(report.deferred.is_empty());
        assert!(repo.is_empty().await);
    }
}
