//! Implementation of the `import` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use crate::adapters::json_file::JsonFilePredictionSource;
use crate::adapters::sqlite::SqlitePredictionRepository;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::domain::DomainError;

use super::open_database;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON file holding an array of host prediction records
    pub file: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct ImportOutput {
    pub file: PathBuf,
    pub imported: usize,
    pub resolved: usize,
    pub rejected: usize,
}

impl CommandOutput for ImportOutput {
    fn to_human(&self) -> String {
        let mut line = format!(
            "Imported {} prediction(s) from {} ({} resolved)",
            self.imported,
            self.file.display(),
            self.resolved
        );
        if self.rejected > 0 {
            line.push_str(&format!("\nRejected {} record(s) without an id", self.rejected));
        }
        line
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ImportArgs, config: &Config, json_mode: bool) -> Result<()> {
    let records = JsonFilePredictionSource::new(&args.file)
        .load_all()
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let pool = open_database(config).await?;
    let repository = SqlitePredictionRepository::new(pool.clone());

    let mut out = ImportOutput {
        file: args.file,
        imported: 0,
        resolved: 0,
        rejected: 0,
    };
    for record in &records {
        match repository.upsert(record).await {
            Ok(()) => {
                out.imported += 1;
                if record.is_resolved() {
                    out.resolved += 1;
                }
            }
            Err(err @ DomainError::ValidationFailed(_)) => {
                warn!(error = %err, "Rejecting prediction record");
                out.rejected += 1;
            }
            Err(err) => return Err(err).context("Failed to store prediction"),
        }
    }
    pool.close().await;

    output(&out, json_mode);
    Ok(())
}
