//! Implementation of the `run` command.

use anyhow::Result;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::services::RunReport;

use super::open_engine;

#[derive(Debug, serde::Serialize)]
pub struct RunOutput {
    #[serde(flatten)]
    pub report: RunReport,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let r = &self.report;
        let mut lines = vec![format!(
            "Learning run complete: {} pattern(s) updated ({} new)",
            r.patterns_updated, r.patterns_created
        )];
        lines.push(format!(
            "  Predictions: {} fetched, {} aggregated, {} without a pattern key",
            r.predictions_fetched, r.predictions_aggregated, r.predictions_filtered
        ));
        if r.skipped > 0 {
            lines.push(format!("  Skipped {} malformed record(s)", r.skipped));
        }
        if r.deferred > 0 {
            lines.push(format!(
                "  Deferred {} pattern(s) ({} prediction(s)) to the next run",
                r.deferred, r.deferred_samples
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let engine = open_engine(config).await?;
    let report = engine.run_once().await?;
    output(&RunOutput { report }, json_mode);
    Ok(())
}
