//! CLI command implementations.

pub mod import;
pub mod init;
pub mod pattern;
pub mod run;
pub mod serve;
pub mod summary;

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::adapters::sqlite::{
    initialize_database, SqliteCheckpointStore, SqlitePatternRepository, SqlitePredictionRepository,
};
use crate::domain::models::Config;
use crate::services::PatternEngine;

/// Open the configured database and build an engine over it.
pub(crate) async fn open_engine(config: &Config) -> Result<PatternEngine> {
    let pool = open_database(config).await?;
    engine_for_pool(pool, config)
}

pub(crate) async fn open_database(config: &Config) -> Result<SqlitePool> {
    initialize_database(&config.database)
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}. Run 'prediction-patterns init' first.",
                config.database.path
            )
        })
}

/// Engine reading predictions from, and storing patterns in, one `SQLite` pool.
pub fn engine_for_pool(pool: SqlitePool, config: &Config) -> Result<PatternEngine> {
    PatternEngine::new(
        Arc::new(SqlitePatternRepository::new(pool.clone())),
        Arc::new(SqlitePredictionRepository::new(pool.clone())),
        Arc::new(SqliteCheckpointStore::new(pool)),
        config,
    )
    .context("Invalid engine configuration")
}
