//! Implementation of the `init` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tokio::fs;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::{ConfigLoader, CONFIG_DIR};

use super::open_database;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_path: PathBuf,
    pub config_written: bool,
    pub database_path: String,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push(format!("Wrote {}", self.config_path.display()));
        } else {
            lines.push(format!("Kept existing {}", self.config_path.display()));
        }
        lines.push(format!("Database ready at {}", self.database_path));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let config_dir = Path::new(CONFIG_DIR);
    fs::create_dir_all(config_dir)
        .await
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    let config_path = config_dir.join("config.yaml");
    let config_written = if args.force || !config_path.exists() {
        fs::write(&config_path, ConfigLoader::default_yaml()?)
            .await
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        true
    } else {
        false
    };

    let pool = open_database(config).await?;
    pool.close().await;

    let out = InitOutput {
        success: true,
        message: "Project initialized.".to_string(),
        config_path,
        config_written,
        database_path: config.database.path.clone(),
    };
    output(&out, json_mode);
    Ok(())
}
