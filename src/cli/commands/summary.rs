//! Implementation of the `summary` command.

use anyhow::Result;

use crate::cli::output::{output, percent, points, CommandOutput};
use crate::domain::models::{Config, PatternSummary};

use super::open_engine;

#[derive(Debug, serde::Serialize)]
pub struct SummaryOutput {
    #[serde(flatten)]
    pub summary: PatternSummary,
}

impl CommandOutput for SummaryOutput {
    fn to_human(&self) -> String {
        let s = &self.summary;
        if s.total_patterns == 0 {
            return "No patterns learned yet.".to_string();
        }
        [
            format!("Patterns:              {}", s.total_patterns),
            format!("Predictions analyzed:  {}", s.sample_size),
            format!("Average AI accuracy:   {}", percent(s.average_ai_accuracy)),
            format!("Average user accuracy: {}", percent(s.average_user_accuracy)),
            format!("Largest adjustment:    {}", points(s.largest_adjustment)),
            format!(
                "Most analyzed:         {}",
                s.most_analyzed_pattern.as_deref().unwrap_or("-")
            ),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let engine = open_engine(config).await?;
    let summary = engine.get_summary().await?;
    output(&SummaryOutput { summary }, json_mode);
    Ok(())
}
