//! Groups resolved predictions into patterns and computes per-key batch statistics.

use std::collections::BTreeMap;

use crate::domain::models::{BatchStat, PatternKey, ResolvedPrediction};

/// Per-key statistics for a batch, plus what was left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub stats: BTreeMap<PatternKey, BatchStat>,
    /// Predictions without a pattern key (missing target type, timeframe or human direction).
    pub filtered: usize,
}

impl Aggregation {
    /// Fold predictions into this aggregation.
    pub fn absorb<'a>(&mut self, predictions: impl IntoIterator<Item = &'a ResolvedPrediction>) {
        for prediction in predictions {
            match PatternKey::from_prediction(prediction) {
                Some(key) => self.stats.entry(key).or_default().record(prediction),
                None => self.filtered += 1,
            }
        }
    }

    /// Number of predictions that landed in some group.
    pub fn grouped(&self) -> u64 {
        self.stats.values().map(|s| s.total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

/// Stateless pattern aggregator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternAggregator;

impl PatternAggregator {
    pub const fn new() -> Self {
        Self
    }

    /// Aggregate a batch. An empty batch yields an empty aggregation.
    pub fn aggregate(&self, predictions: &[ResolvedPrediction]) -> Aggregation {
        let mut aggregation = Aggregation::default();
        aggregation.absorb(predictions);
        aggregation
    }
}
