//! SQLite adapter for CheckpointStore.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BatchStat, PatternKey};
use crate::domain::ports::{CheckpointStore, LearningCheckpoint, PredictionCursor};

/// Cursor row plus the `deferred_stats` table, always written together.
#[derive(Clone)]
pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl SqliteCheckpointStore {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DeferredRow {
    pattern_key: String,
    human_correct_count: i64,
    ai_correct_count: i64,
    sample_size: i64,
    mean_ai_confidence: f64,
}

fn row_to_entry(row: DeferredRow) -> DomainResult<(PatternKey, BatchStat)> {
    let key = PatternKey::parse(&row.pattern_key).ok_or_else(|| {
        DomainError::SerializationError(format!("invalid pattern key '{}' in deferred_stats row", row.pattern_key))
    })?;
    Ok((
        key,
        BatchStat {
            human_correct: row.human_correct_count as u64,
            ai_correct: row.ai_correct_count as u64,
            total: row.sample_size as u64,
            mean_ai_confidence: row.mean_ai_confidence,
        },
    ))
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn load(&self) -> DomainResult<LearningCheckpoint> {
        let cursor: Option<(String, String)> =
            sqlx::query_as("SELECT position, prediction_id FROM learning_cursor WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        let rows: Vec<DeferredRow> = sqlx::query_as(
            "SELECT pattern_key, human_correct_count, ai_correct_count, sample_size, mean_ai_confidence
             FROM deferred_stats"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(LearningCheckpoint {
            cursor: cursor.map(|(position, id)| PredictionCursor { position, id }),
            deferred: rows.into_iter().map(row_to_entry).collect::<DomainResult<BTreeMap<_, _>>>()?,
        })
    }

    async fn save(&self, checkpoint: &LearningCheckpoint) -> DomainResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        match &checkpoint.cursor {
            Some(cursor) => {
                sqlx::query(
                    "INSERT INTO learning_cursor (id, position, prediction_id, updated_at)
                     VALUES (1, ?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                      position = excluded.position,
                      prediction_id = excluded.prediction_id,
                      updated_at = excluded.updated_at"
                )
                .bind(&cursor.position)
                .bind(&cursor.id)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM learning_cursor").execute(&mut *tx).await?;
            }
        }

        sqlx::query("DELETE FROM deferred_stats").execute(&mut *tx).await?;
        for (key, stat) in checkpoint.deferred.iter().filter(|(_, stat)| stat.total > 0) {
            sqlx::query(
                "INSERT INTO deferred_stats
                 (pattern_key, human_correct_count, ai_correct_count, sample_size, mean_ai_confidence, deferred_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            )
            .bind(key.storage_key())
            .bind(stat.human_correct as i64)
            .bind(stat.ai_correct as i64)
            .bind(stat.total as i64)
            .bind(stat.mean_ai_confidence)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
