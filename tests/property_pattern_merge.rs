use prediction_patterns::domain::models::{
    AdjustmentPolicy, BatchStat, Direction, PatternRecord, ResolvedPrediction, TargetType, Timeframe,
};
use prediction_patterns::services::PatternAggregator;
use chrono::Utc;
use proptest::prelude::*;

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Bullish),
        Just(Direction::Bearish),
        Just(Direction::Neutral)
    ]
}

fn prediction() -> impl Strategy<Value = ResolvedPrediction> {
    (
        prop::option::of(prop_oneof![Just(TargetType::Stock), Just(TargetType::Market)]),
        prop_oneof![Just(Timeframe::OneDay), Just(Timeframe::OneWeek)],
        direction(),
        direction(),
        direction(),
        0.0f64..=100.0,
    )
        .prop_map(|(target, timeframe, human, ai, actual, confidence)| {
            let mut p = ResolvedPrediction::new(
                "p",
                TargetType::Stock,
                timeframe,
                human,
                ai,
                confidence,
                actual,
            );
            p.target_type = target;
            p
        })
}

fn stat() -> impl Strategy<Value = BatchStat> {
    (1u64..200)
        .prop_flat_map(|total| (0..=total, 0..=total, Just(total), 0.0f64..=100.0))
        .prop_map(|(human_correct, ai_correct, total, mean_ai_confidence)| BatchStat {
            human_correct,
            ai_correct,
            total,
            mean_ai_confidence,
        })
}

proptest! {
    /// Property: every keyed prediction lands in exactly one group
    #[test]
    fn prop_group_totals_match_keyed_inputs(predictions in prop::collection::vec(prediction(), 0..60)) {
        let aggregation = PatternAggregator::new().aggregate(&predictions);
        let keyed = predictions.iter().filter(|p| p.target_type.is_some()).count() as u64;

        prop_assert_eq!(aggregation.grouped(), keyed);
        prop_assert_eq!(aggregation.filtered as u64 + keyed, predictions.len() as u64);
        for stat in aggregation.stats.values() {
            prop_assert!(stat.total >= 1);
            prop_assert!(stat.human_correct <= stat.total);
            prop_assert!(stat.ai_correct <= stat.total);
        }
    }

    /// Property: merging batches one by one equals merging their union
    #[test]
    fn prop_sequential_merge_equals_union(first in stat(), second in stat()) {
        let policy = AdjustmentPolicy::default();
        let key = prediction_patterns::PatternKey::new(TargetType::Stock, Timeframe::OneDay, Direction::Bullish);

        let sequential = PatternRecord::from_batch(key.clone(), &first, &policy, Utc::now())
            .merged(&second, &policy, Utc::now());

        let mut union = first;
        union.combine(&second);
        let single = PatternRecord::from_batch(key, &union, &policy, Utc::now());

        prop_assert_eq!(sequential.sample_size, single.sample_size);
        prop_assert!((sequential.human_accuracy - single.human_accuracy).abs() < 1e-12);
        prop_assert!((sequential.ai_accuracy - single.ai_accuracy).abs() < 1e-12);
        prop_assert!((sequential.mean_ai_confidence - single.mean_ai_confidence).abs() < 1e-9);
    }

    /// Property: adjustments never exceed the configured bound
    #[test]
    fn prop_adjustment_within_bound(
        s in stat(),
        sensitivity in 0.01f64..10.0,
        max_adjustment in 0.1f64..50.0,
    ) {
        let policy = AdjustmentPolicy { sensitivity, max_adjustment };
        let key = prediction_patterns::PatternKey::new(TargetType::Market, Timeframe::OneWeek, Direction::Neutral);
        let record = PatternRecord::from_batch(key, &s, &policy, Utc::now());

        prop_assert!(record.confidence_adjustment.abs() <= max_adjustment + 1e-12);
        prop_assert!((0.0..=1.0).contains(&record.human_accuracy));
        prop_assert!((0.0..=1.0).contains(&record.ai_accuracy));
    }
}
