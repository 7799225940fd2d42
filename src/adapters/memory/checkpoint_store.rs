//! In-memory checkpoint store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{CheckpointStore, LearningCheckpoint};

#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    checkpoint: RwLock<LearningCheckpoint>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self) -> DomainResult<LearningCheckpoint> {
        Ok(self.checkpoint.read().await.clone())
    }

    async fn save(&self, checkpoint: &LearningCheckpoint) -> DomainResult<()> {
        *self.checkpoint.write().await = checkpoint.clone();
        Ok(())
    }
}
