//! Pattern domain model.
//!
//! A pattern is a cohort of resolved predictions that share a target type,
//! timeframe and human-predicted direction, optionally refined by market
//! condition and sector. Each persisted pattern keeps cumulative raw counts
//! so that merging batches is exactly equivalent to aggregating every
//! prediction at once.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::prediction::{normalize_tag, Direction, ResolvedPrediction, TargetType, Timeframe};

const ABSENT: &str = "*";

/// Grouping key for a pattern.
///
/// Named fields make equality independent of any composite ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternKey {
    pub target_type: TargetType,
    pub timeframe: Timeframe,
    /// The human's predicted direction.
    pub direction: Direction,
    pub market_condition: Option<String>,
    pub sector: Option<String>,
}

impl PatternKey {
    pub const fn new(target_type: TargetType, timeframe: Timeframe, direction: Direction) -> Self {
        Self {
            target_type,
            timeframe,
            direction,
            market_condition: None,
            sector: None,
        }
    }

    pub fn with_market_condition(mut self, condition: impl Into<String>) -> Self {
        self.market_condition = normalize_tag(Some(condition.into()));
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = normalize_tag(Some(sector.into()));
        self
    }

    /// Build the key for a prediction.
    ///
    /// Returns `None` when target type, timeframe or human direction is
    /// missing; such predictions do not take part in aggregation.
    pub fn from_prediction(prediction: &ResolvedPrediction) -> Option<Self> {
        Some(Self {
            target_type: prediction.target_type?,
            timeframe: prediction.timeframe?,
            direction: prediction.human_direction?,
            market_condition: normalize_tag(prediction.market_condition.clone()),
            sector: normalize_tag(prediction.sector.clone()),
        })
    }

    /// Canonical storage form: `target|timeframe|direction|condition|sector`.
    pub fn storage_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.target_type.as_str(),
            self.timeframe.as_str(),
            self.direction.as_str(),
            self.market_condition.as_deref().unwrap_or(ABSENT),
            self.sector.as_deref().unwrap_or(ABSENT),
        )
    }

    /// Parse the canonical storage form. Trailing dimensions may be omitted.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(5, '|');
        let target_type = TargetType::from_str(parts.next()?)?;
        let timeframe = Timeframe::from_str(parts.next()?)?;
        let direction = Direction::from_str(parts.next()?)?;
        let dimension = |part: Option<&str>| {
            part.filter(|p| p.trim() != ABSENT)
                .and_then(|p| normalize_tag(Some(p.to_string())))
        };
        Some(Self {
            target_type,
            timeframe,
            direction,
            market_condition: dimension(parts.next()),
            sector: dimension(parts.next()),
        })
    }

    /// Human-readable label, e.g. `Stock / 1 day / Bullish (sector: tech)`.
    pub fn label(&self) -> String {
        let mut label = format!(
            "{} / {} / {}",
            self.target_type.label(),
            self.timeframe.label(),
            self.direction.label()
        );
        let refinements: Vec<String> = [
            self.market_condition.as_ref().map(|c| format!("condition: {c}")),
            self.sector.as_ref().map(|s| format!("sector: {s}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !refinements.is_empty() {
            label.push_str(&format!(" ({})", refinements.join(", ")));
        }
        label
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Per-key statistics for one batch of predictions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStat {
    pub human_correct: u64,
    pub ai_correct: u64,
    pub total: u64,
    pub mean_ai_confidence: f64,
}

impl BatchStat {
    /// Fold one prediction into the statistic.
    pub fn record(&mut self, prediction: &ResolvedPrediction) {
        let outcome = prediction.outcome();
        self.total += 1;
        if outcome.human_correct() {
            self.human_correct += 1;
        }
        if outcome.ai_correct() {
            self.ai_correct += 1;
        }
        self.mean_ai_confidence +=
            (prediction.ai_confidence - self.mean_ai_confidence) / self.total as f64;
    }

    /// Combine two statistics for the same key.
    pub fn combine(&mut self, other: &Self) {
        let total = self.total + other.total;
        if total == 0 {
            return;
        }
        self.mean_ai_confidence = weighted_mean(
            self.mean_ai_confidence,
            self.total,
            other.mean_ai_confidence,
            other.total,
        );
        self.human_correct += other.human_correct;
        self.ai_correct += other.ai_correct;
        self.total = total;
    }
}

/// How accuracy gaps translate into a confidence adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentPolicy {
    /// Scaling applied to the human-minus-AI gap in percentage points.
    pub sensitivity: f64,
    /// Absolute bound on the adjustment in percentage points.
    pub max_adjustment: f64,
}

impl Default for AdjustmentPolicy {
    fn default() -> Self {
        Self {
            sensitivity: 0.5,
            max_adjustment: 20.0,
        }
    }
}

impl AdjustmentPolicy {
    /// Signed adjustment, in percentage points, for the given accuracies.
    pub fn adjustment(&self, human_accuracy: f64, ai_accuracy: f64) -> f64 {
        let bound = self.max_adjustment.abs();
        ((human_accuracy - ai_accuracy) * 100.0 * self.sensitivity).clamp(-bound, bound)
    }
}

/// A persisted pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub key: PatternKey,
    pub human_correct_count: u64,
    pub ai_correct_count: u64,
    /// Number of predictions folded into this record across all merges.
    pub sample_size: u64,
    pub human_accuracy: f64,
    pub ai_accuracy: f64,
    pub mean_ai_confidence: f64,
    /// Suggested percentage-point correction to AI confidence for this pattern.
    pub confidence_adjustment: f64,
    /// Optimistic concurrency token, bumped by the repository on every write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PatternRecord {
    /// Create a record from the first batch seen for a key.
    pub fn from_batch(
        key: PatternKey,
        stat: &BatchStat,
        policy: &AdjustmentPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            key,
            human_correct_count: stat.human_correct,
            ai_correct_count: stat.ai_correct,
            sample_size: stat.total,
            human_accuracy: 0.0,
            ai_accuracy: 0.0,
            mean_ai_confidence: stat.mean_ai_confidence,
            confidence_adjustment: 0.0,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        record.recompute(policy);
        record
    }

    /// Return this record with a batch folded in.
    ///
    /// Counts are cumulative, so the resulting accuracies equal those of
    /// aggregating every merged prediction in a single batch.
    pub fn merged(&self, stat: &BatchStat, policy: &AdjustmentPolicy, now: DateTime<Utc>) -> Self {
        let mut record = self.clone();
        record.mean_ai_confidence = weighted_mean(
            self.mean_ai_confidence,
            self.sample_size,
            stat.mean_ai_confidence,
            stat.total,
        );
        record.human_correct_count += stat.human_correct;
        record.ai_correct_count += stat.ai_correct;
        record.sample_size += stat.total;
        record.updated_at = now;
        record.recompute(policy);
        record
    }

    fn recompute(&mut self, policy: &AdjustmentPolicy) {
        self.human_accuracy = ratio(self.human_correct_count, self.sample_size);
        self.ai_accuracy = ratio(self.ai_correct_count, self.sample_size);
        self.confidence_adjustment = policy.adjustment(self.human_accuracy, self.ai_accuracy);
    }
}

/// Digest over all stored patterns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub total_patterns: usize,
    /// Unweighted mean across patterns.
    pub average_ai_accuracy: f64,
    /// Unweighted mean across patterns.
    pub average_user_accuracy: f64,
    /// Signed adjustment with the largest magnitude.
    pub largest_adjustment: f64,
    /// Label of the pattern with the largest sample size.
    pub most_analyzed_pattern: Option<String>,
    pub sample_size: u64,
}

fn ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64).clamp(0.0, 1.0)
    }
}

fn weighted_mean(a: f64, a_weight: u64, b: f64, b_weight: u64) -> f64 {
    let total = a_weight + b_weight;
    if total == 0 {
        0.0
    } else {
        a.mul_add(a_weight as f64, b * b_weight as f64) / total as f64
    }
}
