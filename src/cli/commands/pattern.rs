//! Pattern CLI commands for inspecting learned patterns.

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::Cell;

use crate::cli::output::{list_table, output, percent, points, render_list, truncate, CommandOutput};
use crate::domain::models::{Config, PatternKey, PatternRecord};
use crate::domain::DomainError;

use super::open_engine;

#[derive(Args, Debug)]
pub struct PatternArgs {
    #[command(subcommand)]
    pub command: PatternCommands,
}

#[derive(Subcommand, Debug)]
pub enum PatternCommands {
    /// List learned patterns, most analyzed first
    List {
        /// Only show patterns with at least this many samples
        #[arg(long, default_value = "0")]
        min_samples: u64,

        /// Maximum number of patterns to display
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show one pattern
    Show {
        /// Pattern key, e.g. stock|1d|bullish or stock|1d|bullish|volatile|tech
        key: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct PatternOutput {
    pub key: String,
    pub label: String,
    pub sample_size: u64,
    pub human_accuracy: f64,
    pub ai_accuracy: f64,
    pub mean_ai_confidence: f64,
    pub confidence_adjustment: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&PatternRecord> for PatternOutput {
    fn from(r: &PatternRecord) -> Self {
        Self {
            key: r.key.storage_key(),
            label: r.key.label(),
            sample_size: r.sample_size,
            human_accuracy: r.human_accuracy,
            ai_accuracy: r.ai_accuracy,
            mean_ai_confidence: r.mean_ai_confidence,
            confidence_adjustment: r.confidence_adjustment,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PatternListOutput {
    pub patterns: Vec<PatternOutput>,
    pub total: usize,
}

impl CommandOutput for PatternListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["key", "samples", "user", "ai", "adjustment"]);
        for p in &self.patterns {
            table.add_row(vec![
                Cell::new(truncate(&p.key, 48)),
                Cell::new(p.sample_size),
                Cell::new(percent(p.human_accuracy)),
                Cell::new(percent(p.ai_accuracy)),
                Cell::new(points(p.confidence_adjustment)),
            ]);
        }
        render_list("pattern", &table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PatternDetailOutput {
    #[serde(flatten)]
    pub pattern: PatternOutput,
}

impl CommandOutput for PatternDetailOutput {
    fn to_human(&self) -> String {
        let p = &self.pattern;
        [
            format!("Pattern: {}", p.label),
            format!("Key: {}", p.key),
            format!("Samples: {}", p.sample_size),
            format!("User accuracy: {}", percent(p.human_accuracy)),
            format!("AI accuracy: {}", percent(p.ai_accuracy)),
            format!("Mean AI confidence: {:.1}", p.mean_ai_confidence),
            format!("Confidence adjustment: {}", points(p.confidence_adjustment)),
            format!("Created: {}", p.created_at),
            format!("Updated: {}", p.updated_at),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: PatternArgs, config: &Config, json_mode: bool) -> Result<()> {
    let engine = open_engine(config).await?;

    match args.command {
        PatternCommands::List { min_samples, limit } => {
            let records = engine.list_patterns().await?;
            let patterns: Vec<PatternOutput> = records
                .iter()
                .filter(|r| r.sample_size >= min_samples)
                .take(limit)
                .map(PatternOutput::from)
                .collect();

            let out = PatternListOutput {
                total: patterns.len(),
                patterns,
            };
            output(&out, json_mode);
        }

        PatternCommands::Show { key } => {
            let parsed = PatternKey::parse(&key)
                .ok_or_else(|| DomainError::ValidationFailed(format!("Invalid pattern key: {key}")))?;
            let record = engine
                .get_pattern(&parsed)
                .await?
                .ok_or_else(|| DomainError::PatternNotFound(parsed.storage_key()))?;

            let out = PatternDetailOutput {
                pattern: PatternOutput::from(&record),
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
