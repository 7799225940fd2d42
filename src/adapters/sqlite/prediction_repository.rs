//! SQLite adapter over the host application's `predictions` table.
//!
//! Rows are read in `resolution_seq` order. The sequence is assigned by
//! triggers the first time a row becomes resolved, whether the engine or the
//! host wrote it, so a prediction that resolves after the cursor has moved on
//! still lands after the cursor.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::adapters::ingestion::{canonical_timestamp, normalize, RawPrediction};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{PredictionCursor, PredictionPage, PredictionSource};

#[derive(sqlx::FromRow)]
struct ResolvedRow {
    #[sqlx(flatten)]
    raw: RawPrediction,
    resolution_seq: i64,
}

#[derive(Clone)]
pub struct SqlitePredictionRepository {
    pool: SqlitePool,
}

impl SqlitePredictionRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a host prediction. Used by the `import` command.
    ///
    /// Timestamps are stored in canonical UTC form. A resolution time already
    /// on record is kept when the incoming record has none.
    pub async fn upsert(&self, raw: &RawPrediction) -> DomainResult<()> {
        let id = raw
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| DomainError::ValidationFailed("prediction without id".to_string()))?;

        sqlx::query(
            "INSERT INTO predictions
             (id, target_type, target_name, user_prediction, ai_prediction, ai_confidence,
              timeframe, actual_outcome, status, market_condition, sector, created_at, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, COALESCE(?9, 'pending'), ?10, ?11,
                     COALESCE(?12, strftime('%Y-%m-%dT%H:%M:%fZ', 'now')), ?13)
             ON CONFLICT(id) DO UPDATE SET
              target_type = excluded.target_type, target_name = excluded.target_name,
              user_prediction = excluded.user_prediction, ai_prediction = excluded.ai_prediction,
              ai_confidence = excluded.ai_confidence, timeframe = excluded.timeframe,
              actual_outcome = excluded.actual_outcome, status = excluded.status,
              market_condition = excluded.market_condition, sector = excluded.sector,
              created_at = excluded.created_at,
              resolved_at = COALESCE(excluded.resolved_at, predictions.resolved_at)"
        )
        .bind(id)
        .bind(&raw.target_type)
        .bind(&raw.target_name)
        .bind(&raw.user_prediction)
        .bind(&raw.ai_prediction)
        .bind(raw.ai_confidence)
        .bind(&raw.timeframe)
        .bind(&raw.actual_outcome)
        .bind(&raw.status)
        .bind(&raw.market_condition)
        .bind(&raw.sector)
        .bind(stored_timestamp(raw.created_at.as_deref()))
        .bind(stored_timestamp(raw.resolved_at.as_deref()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Canonical form when parseable; unparseable text is kept so normalization
/// can report it against the record.
fn stored_timestamp(value: Option<&str>) -> Option<String> {
    value.map(|v| canonical_timestamp(v).unwrap_or_else(|| v.to_string()))
}

fn since_sequence(since: Option<&PredictionCursor>) -> DomainResult<i64> {
    match since {
        None => Ok(0),
        Some(cursor) => cursor
            .position
            .parse::<i64>()
            .map_err(|_| DomainError::InputFetch(format!("invalid cursor position '{}'", cursor.position))),
    }
}

#[async_trait]
impl PredictionSource for SqlitePredictionRepository {
    async fn fetch_resolved(
        &self,
        since: Option<&PredictionCursor>,
        limit: u32,
    ) -> DomainResult<PredictionPage> {
        let since_seq = since_sequence(since)?;

        let rows: Vec<ResolvedRow> = sqlx::query_as(
            "SELECT id, target_type, target_name, user_prediction, ai_prediction, ai_confidence,
                    timeframe, actual_outcome, status, market_condition, sector, created_at,
                    resolved_at, resolution_seq
             FROM predictions
             WHERE resolution_seq > ?1
               AND lower(trim(status)) IN ('completed', 'resolved')
             ORDER BY resolution_seq ASC
             LIMIT ?2"
        )
        .bind(since_seq)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::InputFetch(e.to_string()))?;

        let mut page = PredictionPage {
            next_cursor: rows.last().map(|row| PredictionCursor {
                position: row.resolution_seq.to_string(),
                id: row.raw.id.clone().unwrap_or_default(),
            }),
            ..PredictionPage::default()
        };

        for row in rows {
            match normalize(row.raw) {
                Ok(prediction) => page.predictions.push(prediction),
                Err(err) => page.rejected.push(err),
            }
        }

        Ok(page)
    }
}
