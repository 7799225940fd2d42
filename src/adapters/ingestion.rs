//! Ingestion boundary for predictions coming from the host application.
//!
//! Host records are loosely typed: field names arrive in either snake_case or
//! camelCase and categorical values in free-form casing. Every source adapter
//! funnels its records through [`normalize`], so nothing past this module sees
//! a raw record.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::prediction::normalize_tag;
use crate::domain::models::{Direction, ResolvedPrediction, TargetType, Timeframe};

/// Prediction as stored by the host application.
#[derive(Debug, Clone, Default, Deserialize, sqlx::FromRow)]
pub struct RawPrediction {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default, alias = "targetType")]
    pub target_type: Option<String>,
    #[serde(default, alias = "targetName", alias = "target")]
    pub target_name: Option<String>,
    #[serde(
        default,
        alias = "userPrediction",
        alias = "human_prediction",
        alias = "humanPrediction",
        alias = "humanDirection"
    )]
    pub user_prediction: Option<String>,
    #[serde(default, alias = "aiPrediction", alias = "ai_direction", alias = "aiDirection")]
    pub ai_prediction: Option<String>,
    #[serde(default, alias = "aiConfidence")]
    pub ai_confidence: Option<f64>,
    #[serde(default, alias = "timeFrame", alias = "time_frame")]
    pub timeframe: Option<String>,
    #[serde(
        default,
        alias = "actualOutcome",
        alias = "actual_direction",
        alias = "actualDirection"
    )]
    pub actual_outcome: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "marketCondition")]
    pub market_condition: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "resolvedAt")]
    pub resolved_at: Option<String>,
}

impl RawPrediction {
    /// Whether the host considers this prediction resolved.
    pub fn is_resolved(&self) -> bool {
        self.status.as_deref().is_some_and(is_resolved_status)
    }

    /// Ordering position for sources without a resolution sequence: the
    /// canonical resolution time, else the canonical creation time.
    pub fn resolution_position(&self) -> String {
        self.resolved_at
            .as_deref()
            .and_then(canonical_timestamp)
            .or_else(|| self.created_at.as_deref().and_then(canonical_timestamp))
            .unwrap_or_default()
    }
}

/// Statuses the host uses for predictions whose outcome is known.
pub fn is_resolved_status(status: &str) -> bool {
    matches!(status.trim().to_lowercase().as_str(), "completed" | "resolved")
}

/// Normalize a host record into a [`ResolvedPrediction`].
///
/// Unknown or missing categorical fields (target type, timeframe, human
/// direction) become `None` and are filtered later by the key builder.
/// Missing data needed to score or place the record yields
/// `DomainError::MalformedPrediction`.
pub fn normalize(raw: RawPrediction) -> DomainResult<ResolvedPrediction> {
    let id = raw
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| malformed("<unknown>", "missing id"))?;

    let actual_direction = match raw.actual_outcome.as_deref() {
        None => return Err(malformed(&id, "missing actual outcome")),
        Some(value) => Direction::from_str(value)
            .ok_or_else(|| malformed(&id, &format!("unrecognized actual outcome '{value}'")))?,
    };

    let ai_direction = match raw.ai_prediction.as_deref() {
        None => return Err(malformed(&id, "missing AI prediction")),
        Some(value) => Direction::from_str(value)
            .ok_or_else(|| malformed(&id, &format!("unrecognized AI prediction '{value}'")))?,
    };

    let ai_confidence = raw
        .ai_confidence
        .ok_or_else(|| malformed(&id, "missing AI confidence"))?;
    if !ai_confidence.is_finite() || !(0.0..=100.0).contains(&ai_confidence) {
        return Err(malformed(
            &id,
            &format!("AI confidence {ai_confidence} outside 0-100"),
        ));
    }

    let created_at = match raw.created_at.as_deref() {
        None => return Err(malformed(&id, "missing created_at")),
        Some(value) => parse_timestamp(value)
            .ok_or_else(|| malformed(&id, &format!("unparseable created_at '{value}'")))?,
    };

    Ok(ResolvedPrediction {
        target_type: raw.target_type.as_deref().and_then(TargetType::from_str),
        target_name: raw.target_name.unwrap_or_default().trim().to_string(),
        human_direction: raw.user_prediction.as_deref().and_then(Direction::from_str),
        ai_direction,
        ai_confidence,
        timeframe: raw.timeframe.as_deref().and_then(Timeframe::from_str),
        actual_direction,
        market_condition: normalize_tag(raw.market_condition),
        sector: normalize_tag(raw.sector),
        created_at,
        id,
    })
}

/// Parse RFC 3339 or `SQLite` `datetime()` output (assumed UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Rewrite a timestamp into the single UTC form used for storage and ordering.
///
/// The output is fixed-width (`2024-03-02T12:00:00.000000000Z`), so canonical
/// values sort chronologically as plain text.
pub fn canonical_timestamp(value: &str) -> Option<String> {
    parse_timestamp(value).map(|ts| ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

fn malformed(id: &str, reason: &str) -> DomainError {
    DomainError::MalformedPrediction {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
