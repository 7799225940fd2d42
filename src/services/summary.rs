//! Digest of all stored patterns for display.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{PatternRecord, PatternSummary};
use crate::domain::ports::PatternRepository;

pub struct SummaryReporter {
    repository: Arc<dyn PatternRepository>,
}

impl SummaryReporter {
    pub fn new(repository: Arc<dyn PatternRepository>) -> Self {
        Self { repository }
    }

    pub async fn summarize(&self) -> DomainResult<PatternSummary> {
        let records = self.repository.list().await?;
        Ok(summarize_records(&records))
    }
}

/// Compute the digest for a set of records.
///
/// Accuracy averages are plain means over patterns, not weighted by sample
/// size; consumers rely on that.
pub fn summarize_records(records: &[PatternRecord]) -> PatternSummary {
    if records.is_empty() {
        return PatternSummary::default();
    }

    let count = records.len() as f64;
    let mut most_analyzed: Option<&PatternRecord> = None;
    let mut largest_adjustment = 0.0_f64;
    let mut summary = PatternSummary {
        total_patterns: records.len(),
        ..PatternSummary::default()
    };

    for record in records {
        summary.average_ai_accuracy += record.ai_accuracy / count;
        summary.average_user_accuracy += record.human_accuracy / count;
        summary.sample_size += record.sample_size;

        if record.confidence_adjustment.abs() > largest_adjustment.abs() {
            largest_adjustment = record.confidence_adjustment;
        }
        if most_analyzed.map_or(true, |m| record.sample_size > m.sample_size) {
            most_analyzed = Some(record);
        }
    }

    summary.largest_adjustment = largest_adjustment;
    summary.most_analyzed_pattern = most_analyzed.map(|r| r.key.label());
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPatternRepository;
    use crate::domain::models::{AdjustmentPolicy, BatchStat, Direction, PatternKey, TargetType, Timeframe};
    use chrono::Utc;

    fn record(key: PatternKey, human_correct: u64, ai_correct: u64, total: u64) -> PatternRecord {
        let stat = BatchStat {
            human_correct,
            ai_correct,
            total,
            mean_ai_confidence: 50.0,
        };
        PatternRecord::from_batch(key, &stat, &AdjustmentPolicy::default(), Utc::now())
    }

    #[tokio::test]
    async fn test_empty_store_summary() {
        let reporter = SummaryReporter::new(Arc::new(InMemoryPatternRepository::new()));
        let summary = reporter.summarize().await.unwrap();

        assert_eq!(summary.total_patterns, 0);
        assert_eq!(summary.sample_size, 0);
        assert!(summary.average_ai_accuracy.abs() < f64::EPSILON);
        assert!(summary.average_user_accuracy.abs() < f64::EPSILON);
        assert!(summary.largest_adjustment.abs() < f64::EPSILON);
        assert!(summary.most_analyzed_pattern.is_none());
    }

    #[test]
    fn test_averages_are_unweighted() {
        let big = PatternKey::new(TargetType::Stock, Timeframe::OneDay, Direction::Bullish);
        let small = PatternKey::new(TargetType::Market, Timeframe::OneMonth, Direction::Bearish);
        let records = vec![record(big.clone(), 90, 10, 100), record(small, 0, 1, 1)];

        let summary = summarize_records(&records);

        assert_eq!(summary.total_patterns, 2);
        assert_eq!(summary.sample_size, 101);
        // (0.9 + 0.0) / 2, not 90 / 101
        assert!((summary.average_user_accuracy - 0.45).abs() < 1e-12);
        assert!((summary.average_ai_accuracy - 0.55).abs() < 1e-12);
        assert_eq!(summary.most_analyzed_pattern, Some(big.label()));
    }

    #[test]
    fn test_largest_adjustment_keeps_sign() {
        let up = PatternKey::new(TargetType::Stock, Timeframe::OneDay, Direction::Bullish);
        let down = PatternKey::new(TargetType::Sector, Timeframe::OneWeek, Direction::Neutral);
        // +5 points and -20 points (clamped)
        let records = vec![record(up, 6, 5, 10), record(down, 0, 10, 10)];

        let summary = summarize_records(&records);
        assert!((summary.largest_adjustment + 20.0).abs() < 1e-12);
    }
}
