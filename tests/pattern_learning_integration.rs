//! End-to-end learning runs against a `SQLite` database file.

mod common;

use prediction_patterns::adapters::sqlite::{initialize_database, SqlitePredictionRepository};
use prediction_patterns::cli::commands::engine_for_pool;
use prediction_patterns::domain::models::{Direction, PatternKey, TargetType, Timeframe};

use common::{completed, setup_test_logging, temp_db_config};

fn stock_bullish() -> PatternKey {
    PatternKey::new(TargetType::Stock, Timeframe::OneDay, Direction::Bullish)
}

#[tokio::test]
async fn test_two_prediction_scenario() {
    setup_test_logging();
    let (_dir, config) = temp_db_config();
    let pool = initialize_database(&config.database).await.unwrap();
    let predictions = SqlitePredictionRepository::new(pool.clone());

    predictions
        .upsert(&completed("p1", "bullish", "bearish", 70.0, "bullish", "2024-03-02T09:00:00Z"))
        .await
        .unwrap();
    predictions
        .upsert(&completed("p2", "bullish", "bearish", 80.0, "bearish", "2024-03-02T10:00:00Z"))
        .await
        .unwrap();

    let engine = engine_for_pool(pool, &config).unwrap();
    let report = engine.run_once().await.unwrap();
    assert_eq!(report.patterns_created, 1);
    assert_eq!(report.predictions_aggregated, 2);

    let record = engine.get_pattern(&stock_bullish()).await.unwrap().unwrap();
    assert_eq!(record.sample_size, 2);
    assert!((record.human_accuracy - 0.5).abs() < 1e-12);
    assert!((record.ai_accuracy - 0.5).abs() < 1e-12);
    assert!(record.confidence_adjustment.abs() < 1e-12);
    assert!((record.mean_ai_confidence - 75.0).abs() < 1e-9);

    let summary = engine.get_summary().await.unwrap();
    assert_eq!(summary.total_patterns, 1);
    assert_eq!(summary.sample_size, 2);
    assert_eq!(summary.most_analyzed_pattern, Some(stock_bullish().label()));
}

#[tokio::test]
async fn test_restart_does_not_double_count() {
    let (_dir, config) = temp_db_config();

    {
        let pool = initialize_database(&config.database).await.unwrap();
        let predictions = SqlitePredictionRepository::new(pool.clone());
        for i in 0..10 {
            let actual = if i < 6 { "bullish" } else { "bearish" };
            let ai = if i < 5 { "bullish" } else { "bearish" };
            let resolved = format!("2024-03-02T09:{i:02}:00Z");
            predictions
                .upsert(&completed(&format!("a{i}"), "bullish", ai, 60.0, actual, &resolved))
                .await
                .unwrap();
        }
        engine_for_pool(pool.clone(), &config).unwrap().run_once().await.unwrap();
        pool.close().await;
    }

    // New process: the saved cursor skips what was already merged.
    let pool = initialize_database(&config.database).await.unwrap();
    let predictions = SqlitePredictionRepository::new(pool.clone());
    for i in 0..5 {
        let actual = if i < 2 { "bullish" } else { "bearish" };
        let ai = if i < 1 { "bullish" } else { "bearish" };
        let resolved = format!("2024-03-03T09:{i:02}:00Z");
        predictions
            .upsert(&completed(&format!("b{i}"), "bullish", ai, 60.0, actual, &resolved))
            .await
            .unwrap();
    }

    let engine = engine_for_pool(pool, &config).unwrap();
    let report = engine.run_once().await.unwrap();
    assert_eq!(report.predictions_fetched, 5);

    let record = engine.get_pattern(&stock_bullish()).await.unwrap().unwrap();
    assert_eq!(record.sample_size, 15);
    assert!((record.human_accuracy - 8.0 / 15.0).abs() < 1e-12);

    let report = engine.run_once().await.unwrap();
    assert_eq!(report.predictions_fetched, 0);
    assert_eq!(
        engine.get_pattern(&stock_bullish()).await.unwrap().unwrap().sample_size,
        15
    );
}

#[tokio::test]
async fn test_pending_and_malformed_records() {
    let (_dir, config) = temp_db_config();
    let pool = initialize_database(&config.database).await.unwrap();
    let predictions = SqlitePredictionRepository::new(pool.clone());

    let mut pending = completed("pending", "bullish", "bullish", 50.0, "bullish", "2024-03-02T09:00:00Z");
    pending.status = Some("pending".to_string());
    pending.actual_outcome = None;
    predictions.upsert(&pending).await.unwrap();

    let mut no_confidence = completed("broken", "bullish", "bullish", 50.0, "bullish", "2024-03-02T09:01:00Z");
    no_confidence.ai_confidence = None;
    predictions.upsert(&no_confidence).await.unwrap();

    let mut unknown_timeframe = completed("odd", "bullish", "bullish", 50.0, "bullish", "2024-03-02T09:02:00Z");
    unknown_timeframe.timeframe = Some("5y".to_string());
    predictions.upsert(&unknown_timeframe).await.unwrap();

    predictions
        .upsert(&completed("ok", "bearish", "bullish", 90.0, "bearish", "2024-03-02T09:03:00Z"))
        .await
        .unwrap();

    let engine = engine_for_pool(pool, &config).unwrap();
    let report = engine.run_once().await.unwrap();

    assert_eq!(report.predictions_fetched, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.predictions_filtered, 1);
    assert_eq!(report.patterns_updated, 1);

    let key = PatternKey::new(TargetType::Stock, Timeframe::OneDay, Direction::Bearish);
    let record = engine.get_pattern(&key).await.unwrap().unwrap();
    assert!((record.confidence_adjustment - 20.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_contextual_dimensions_form_separate_patterns() {
    let (_dir, config) = temp_db_config();
    let pool = initialize_database(&config.database).await.unwrap();
    let predictions = SqlitePredictionRepository::new(pool.clone());

    let mut tech = completed("t1", "bullish", "bearish", 65.0, "bullish", "2024-03-02T09:00:00Z");
    tech.sector = Some("Technology".to_string());
    tech.market_condition = Some("Volatile".to_string());
    predictions.upsert(&tech).await.unwrap();
    predictions
        .upsert(&completed("plain", "bullish", "bearish", 65.0, "bullish", "2024-03-02T09:01:00Z"))
        .await
        .unwrap();

    let engine = engine_for_pool(pool, &config).unwrap();
    engine.run_once().await.unwrap();

    let patterns = engine.list_patterns().await.unwrap();
    assert_eq!(patterns.len(), 2);

    let contextual = stock_bullish()
        .with_market_condition("volatile")
        .with_sector("technology");
    let record = engine.get_pattern(&contextual).await.unwrap().unwrap();
    assert_eq!(record.sample_size, 1);
    assert_eq!(PatternKey::parse(&contextual.storage_key()), Some(contextual));
}

#[tokio::test]
async fn test_prediction_resolving_after_a_run_is_learned() {
    let (_dir, config) = temp_db_config();
    let pool = initialize_database(&config.database).await.unwrap();
    let predictions = SqlitePredictionRepository::new(pool.clone());

    // Made first, resolved only after the other call was learned.
    let mut monthly = completed("a", "bullish", "bearish", 70.0, "bullish", "unused");
    monthly.created_at = Some("2024-03-01T09:00:00Z".to_string());
    monthly.timeframe = Some("1d".to_string());
    monthly.status = Some("pending".to_string());
    monthly.actual_outcome = None;
    monthly.resolved_at = None;
    predictions.upsert(&monthly).await.unwrap();

    let mut daily = completed("b", "bullish", "bearish", 70.0, "bullish", "unused");
    daily.created_at = Some("2024-03-02T09:00:00Z".to_string());
    daily.resolved_at = None;
    predictions.upsert(&daily).await.unwrap();

    let engine = engine_for_pool(pool, &config).unwrap();
    let report = engine.run_once().await.unwrap();
    assert_eq!(report.predictions_fetched, 1);

    monthly.status = Some("completed".to_string());
    monthly.actual_outcome = Some("bearish".to_string());
    predictions.upsert(&monthly).await.unwrap();

    let report = engine.run_once().await.unwrap();
    assert_eq!(report.predictions_fetched, 1);
    let record = engine.get_pattern(&stock_bullish()).await.unwrap().unwrap();
    assert_eq!(record.sample_size, 2);
    assert_eq!(record.human_correct_count, 1);
}

#[tokio::test]
async fn test_mixed_timestamp_formats_are_not_skipped() {
    let (_dir, config) = temp_db_config();
    let pool = initialize_database(&config.database).await.unwrap();
    let predictions = SqlitePredictionRepository::new(pool.clone());
    let engine = engine_for_pool(pool, &config).unwrap();

    predictions
        .upsert(&completed("a", "bullish", "bearish", 70.0, "bullish", "2024-03-02T09:00:00Z"))
        .await
        .unwrap();
    engine.run_once().await.unwrap();

    // SQLite datetime() text, later the same day.
    predictions
        .upsert(&completed("b", "bullish", "bearish", 70.0, "bullish", "2024-03-02 12:00:00"))
        .await
        .unwrap();
    // Resolution time earlier than the cursor's.
    predictions
        .upsert(&completed("c", "bullish", "bearish", 70.0, "bearish", "2024-03-01 18:00:00"))
        .await
        .unwrap();

    let report = engine.run_once().await.unwrap();
    assert_eq!(report.predictions_fetched, 2);
    assert_eq!(
        engine.get_pattern(&stock_bullish()).await.unwrap().unwrap().sample_size,
        3
    );
}
