//! SQLite adapter for PatternRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::adapters::sqlite::parse_datetime;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Direction, PatternKey, PatternRecord, TargetType, Timeframe};
use crate::domain::ports::PatternRepository;

#[derive(Clone)]
pub struct SqlitePatternRepository {
    pool: SqlitePool,
}

impl SqlitePatternRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PatternRow {
    #[allow(dead_code)]
    pattern_key: String,
    target_type: String,
    timeframe: String,
    direction: String,
    market_condition: Option<String>,
    sector: Option<String>,
    human_correct_count: i64,
    ai_correct_count: i64,
    sample_size: i64,
    human_accuracy: f64,
    ai_accuracy: f64,
    mean_ai_confidence: f64,
    confidence_adjustment: f64,
    version: i64,
    created_at: String,
    updated_at: String,
}

fn row_to_record(row: PatternRow) -> DomainResult<PatternRecord> {
    let invalid = |field: &str, value: &str| {
        DomainError::SerializationError(format!("invalid {field} '{value}' in patterns row"))
    };

    let key = PatternKey {
        target_type: TargetType::from_str(&row.target_type)
            .ok_or_else(|| invalid("target_type", &row.target_type))?,
        timeframe: Timeframe::from_str(&row.timeframe)
            .ok_or_else(|| invalid("timeframe", &row.timeframe))?,
        direction: Direction::from_str(&row.direction)
            .ok_or_else(|| invalid("direction", &row.direction))?,
        market_condition: row.market_condition,
        sector: row.sector,
    };

    Ok(PatternRecord {
        key,
        human_correct_count: row.human_correct_count as u64,
        ai_correct_count: row.ai_correct_count as u64,
        sample_size: row.sample_size as u64,
        human_accuracy: row.human_accuracy,
        ai_accuracy: row.ai_accuracy,
        mean_ai_confidence: row.mean_ai_confidence,
        confidence_adjustment: row.confidence_adjustment,
        version: row.version,
        created_at: parse_datetime(&row.created_at)?,
        updated_at: parse_datetime(&row.updated_at)?,
    })
}

fn conflict(key: &PatternKey) -> DomainError {
    DomainError::ConcurrencyConflict {
        entity: "pattern".to_string(),
        id: key.storage_key(),
    }
}

#[async_trait]
impl PatternRepository for SqlitePatternRepository {
    async fn get(&self, key: &PatternKey) -> DomainResult<Option<PatternRecord>> {
        let row: Option<PatternRow> =
            sqlx::query_as("SELECT * FROM patterns WHERE pattern_key = ?")
                .bind(key.storage_key())
                .fetch_optional(&self.pool)
                .await?;

        row.map(row_to_record).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<PatternRecord>> {
        let rows: Vec<PatternRow> =
            sqlx::query_as("SELECT * FROM patterns ORDER BY sample_size DESC, pattern_key ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn insert(&self, record: &PatternRecord) -> DomainResult<PatternRecord> {
        let stored = PatternRecord {
            version: 1,
            ..record.clone()
        };

        let result = sqlx::query(
            "INSERT INTO patterns
             (pattern_key, target_type, timeframe, direction, market_condition, sector,
              human_correct_count, ai_correct_count, sample_size,
              human_accuracy, ai_accuracy, mean_ai_confidence, confidence_adjustment,
              version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(pattern_key) DO NOTHING"
        )
        .bind(stored.key.storage_key())
        .bind(stored.key.target_type.as_str())
        .bind(stored.key.timeframe.as_str())
        .bind(stored.key.direction.as_str())
        .bind(&stored.key.market_condition)
        .bind(&stored.key.sector)
        .bind(stored.human_correct_count as i64)
        .bind(stored.ai_correct_count as i64)
        .bind(stored.sample_size as i64)
        .bind(stored.human_accuracy)
        .bind(stored.ai_accuracy)
        .bind(stored.mean_ai_confidence)
        .bind(stored.confidence_adjustment)
        .bind(stored.version)
        .bind(stored.created_at.to_rfc3339())
        .bind(stored.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(conflict(&stored.key));
        }
        Ok(stored)
    }

    async fn update(&self, record: &PatternRecord) -> DomainResult<PatternRecord> {
        let stored = PatternRecord {
            version: record.version + 1,
            ..record.clone()
        };

        // Compare-and-swap on version: a concurrent writer makes this a no-op.
        let result = sqlx::query(
            "UPDATE patterns SET
             human_correct_count = ?2, ai_correct_count = ?3, sample_size = ?4,
             human_accuracy = ?5, ai_accuracy = ?6, mean_ai_confidence = ?7,
             confidence_adjustment = ?8, version = ?9, updated_at = ?10
             WHERE pattern_key = ?1 AND version = ?11"
        )
        .bind(stored.key.storage_key())
        .bind(stored.human_correct_count as i64)
        .bind(stored.ai_correct_count as i64)
        .bind(stored.sample_size as i64)
        .bind(stored.human_accuracy)
        .bind(stored.ai_accuracy)
        .bind(stored.mean_ai_confidence)
        .bind(stored.confidence_adjustment)
        .bind(stored.version)
        .bind(stored.updated_at.to_rfc3339())
        .bind(record.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(conflict(&stored.key));
        }
        Ok(stored)
    }
}
