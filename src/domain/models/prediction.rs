//! Resolved prediction domain model.
//!
//! A resolved prediction pairs a human call and an AI call on the same
//! target with the direction the market actually moved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of instrument a prediction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Market,
    Sector,
    Stock,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Sector => "sector",
            Self::Stock => "stock",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "market" | "index" => Some(Self::Market),
            "sector" => Some(Self::Sector),
            "stock" | "equity" | "ticker" => Some(Self::Stock),
            _ => None,
        }
    }

    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Sector => "Sector",
            Self::Stock => "Stock",
        }
    }
}

/// Horizon over which a prediction is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::OneWeek => "1w",
            Self::OneMonth => "1m",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect();
        match normalized.as_str() {
            "1d" | "1day" | "day" | "daily" => Some(Self::OneDay),
            "1w" | "1week" | "week" | "weekly" => Some(Self::OneWeek),
            "1m" | "1month" | "month" | "monthly" | "1mo" => Some(Self::OneMonth),
            _ => None,
        }
    }

    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneDay => "1 day",
            Self::OneWeek => "1 week",
            Self::OneMonth => "1 month",
        }
    }
}

/// Predicted or observed market direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bullish" | "bull" | "up" => Some(Self::Bullish),
            "bearish" | "bear" | "down" => Some(Self::Bearish),
            "neutral" | "flat" | "sideways" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bullish => "Bullish",
            Self::Bearish => "Bearish",
            Self::Neutral => "Neutral",
        }
    }
}

/// Which party called the direction correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    HumanCorrect,
    AiCorrect,
    BothCorrect,
    NeitherCorrect,
}

impl Outcome {
    /// Classify from the two correctness flags.
    pub const fn classify(human_correct: bool, ai_correct: bool) -> Self {
        match (human_correct, ai_correct) {
            (true, true) => Self::BothCorrect,
            (true, false) => Self::HumanCorrect,
            (false, true) => Self::AiCorrect,
            (false, false) => Self::NeitherCorrect,
        }
    }

    pub const fn human_correct(self) -> bool {
        matches!(self, Self::HumanCorrect | Self::BothCorrect)
    }

    pub const fn ai_correct(self) -> bool {
        matches!(self, Self::AiCorrect | Self::BothCorrect)
    }
}

/// A prediction whose actual direction has been observed.
///
/// Categorical fields that feed the pattern key are optional: records from
/// the host application may carry unknown or missing values, and those
/// records are filtered out of aggregation rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrediction {
    pub id: String,
    pub target_type: Option<TargetType>,
    pub target_name: String,
    pub human_direction: Option<Direction>,
    pub ai_direction: Direction,
    /// Reported AI confidence, 0-100.
    pub ai_confidence: f64,
    pub timeframe: Option<Timeframe>,
    pub actual_direction: Direction,
    pub market_condition: Option<String>,
    pub sector: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ResolvedPrediction {
    /// Create a fully keyed prediction with no optional tags.
    pub fn new(
        id: impl Into<String>,
        target_type: TargetType,
        timeframe: Timeframe,
        human_direction: Direction,
        ai_direction: Direction,
        ai_confidence: f64,
        actual_direction: Direction,
    ) -> Self {
        Self {
            id: id.into(),
            target_type: Some(target_type),
            target_name: String::new(),
            human_direction: Some(human_direction),
            ai_direction,
            ai_confidence,
            timeframe: Some(timeframe),
            actual_direction,
            market_condition: None,
            sector: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_target_name(mut self, name: impl Into<String>) -> Self {
        self.target_name = name.into();
        self
    }

    pub fn with_market_condition(mut self, condition: impl Into<String>) -> Self {
        self.market_condition = normalize_tag(Some(condition.into()));
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = normalize_tag(Some(sector.into()));
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn is_human_correct(&self) -> bool {
        self.human_direction == Some(self.actual_direction)
    }

    pub fn is_ai_correct(&self) -> bool {
        self.ai_direction == self.actual_direction
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::classify(self.is_human_correct(), self.is_ai_correct())
    }
}

/// Normalize a free-form refinement tag (market condition, sector).
///
/// Tags are trimmed and lower-cased; blank tags collapse to `None` so they
/// fall into the coarser bucket instead of creating a distinct one. `|` is
/// reserved as the storage key separator.
pub fn normalize_tag(tag: Option<String>) -> Option<String> {
    tag.map(|t| t.trim().to_lowercase().replace('|', "/"))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_parsing_aliases() {
        assert_eq!(TargetType::from_str(" Stock "), Some(TargetType::Stock));
        assert_eq!(TargetType::from_str("crypto"), None);
        assert_eq!(Timeframe::from_str("1-Day"), Some(Timeframe::OneDay));
        assert_eq!(Timeframe::from_str("1 week"), Some(Timeframe::OneWeek));
        assert_eq!(Timeframe::from_str("monthly"), Some(Timeframe::OneMonth));
        assert_eq!(Timeframe::from_str("1y"), None);
        assert_eq!(Direction::from_str("UP"), Some(Direction::Bullish));
        assert_eq!(Direction::from_str("bearish"), Some(Direction::Bearish));
    }

    #[test]
    fn test_as_str_round_trips_through_from_str() {
        for t in [TargetType::Market, TargetType::Sector, TargetType::Stock] {
            assert_eq!(TargetType::from_str(t.as_str()), Some(t));
        }
        for t in [Timeframe::OneDay, Timeframe::OneWeek, Timeframe::OneMonth] {
            assert_eq!(Timeframe::from_str(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_outcome_classification() {
        let p = ResolvedPrediction::new(
            "p1",
            TargetType::Stock,
            Timeframe::OneDay,
            Direction::Bullish,
            Direction::Bearish,
            70.0,
            Direction::Bullish,
        );
        assert_eq!(p.outcome(), Outcome::HumanCorrect);

        let p = ResolvedPrediction { actual_direction: Direction::Bearish, ..p };
        assert_eq!(p.outcome(), Outcome::AiCorrect);

        let p = ResolvedPrediction { human_direction: Some(Direction::Bearish), ..p };
        assert_eq!(p.outcome(), Outcome::BothCorrect);

        let p = ResolvedPrediction { actual_direction: Direction::Neutral, ..p };
        assert_eq!(p.outcome(), Outcome::NeitherCorrect);
    }

    #[test]
    fn test_missing_human_direction_is_never_correct() {
        let mut p = ResolvedPrediction::new(
            "p1",
            TargetType::Market,
            Timeframe::OneWeek,
            Direction::Bullish,
            Direction::Bullish,
            50.0,
            Direction::Bullish,
        );
        p.human_direction = None;
        assert!(!p.is_human_correct());
        assert_eq!(p.outcome(), Outcome::AiCorrect);
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag(Some("  Tech ".to_string())), Some("tech".to_string()));
        assert_eq!(normalize_tag(Some("   ".to_string())), None);
        assert_eq!(normalize_tag(Some("Bull|Run".to_string())), Some("bull/run".to_string()));
        assert_eq!(normalize_tag(None), None);
    }
}
