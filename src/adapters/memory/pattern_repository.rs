//! In-memory pattern repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{PatternKey, PatternRecord};
use crate::domain::ports::PatternRepository;

/// Pattern repository backed by a map, with the same version checks as SQLite.
#[derive(Debug, Default)]
pub struct InMemoryPatternRepository {
    records: RwLock<HashMap<PatternKey, PatternRecord>>,
}

impl InMemoryPatternRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn conflict(key: &PatternKey) -> DomainError {
    DomainError::ConcurrencyConflict {
        entity: "pattern".to_string(),
        id: key.storage_key(),
    }
}

#[async_trait]
impl PatternRepository for InMemoryPatternRepository {
    async fn get(&self, key: &PatternKey) -> DomainResult<Option<PatternRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<PatternRecord>> {
        let mut records: Vec<PatternRecord> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.sample_size.cmp(&a.sample_size).then_with(|| a.key.cmp(&b.key)));
        Ok(records)
    }

    async fn insert(&self, record: &PatternRecord) -> DomainResult<PatternRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.key) {
            return Err(conflict(&record.key));
        }
        let stored = PatternRecord {
            version: 1,
            ..record.clone()
        };
        records.insert(stored.key.clone(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: &PatternRecord) -> DomainResult<PatternRecord> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.key) {
            Some(current) if current.version == record.version => {
                *current = PatternRecord {
                    version: record.version + 1,
                    ..record.clone()
                };
                Ok(current.clone())
            }
            _ => Err(conflict(&record.key)),
        }
    }
}
