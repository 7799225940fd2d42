//! Common test utilities for integration tests

use prediction_patterns::adapters::ingestion::RawPrediction;
use prediction_patterns::domain::models::{Config, DatabaseConfig};
use tempfile::TempDir;

/// Config pointing at a fresh database file inside a temp dir.
///
/// Keep the `TempDir` alive for as long as the database is used.
pub fn temp_db_config() -> (TempDir, Config) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.database = DatabaseConfig {
        path: dir.path().join("patterns.db").display().to_string(),
        max_connections: 2,
    };
    (dir, config)
}

/// A completed host prediction record.
pub fn completed(id: &str, user: &str, ai: &str, confidence: f64, actual: &str, resolved_at: &str) -> RawPrediction {
    RawPrediction {
        id: Some(id.to_string()),
        target_type: Some("stock".to_string()),
        target_name: Some("AAPL".to_string()),
        user_prediction: Some(user.to_string()),
        ai_prediction: Some(ai.to_string()),
        ai_confidence: Some(confidence),
        timeframe: Some("1d".to_string()),
        actual_outcome: Some(actual.to_string()),
        status: Some("completed".to_string()),
        created_at: Some("2024-03-01T09:00:00Z".to_string()),
        resolved_at: Some(resolved_at.to_string()),
        ..Default::default()
    }
}

/// Setup test logging
#[allow(dead_code)]
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
