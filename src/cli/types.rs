//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use super::commands::import::ImportArgs;
use super::commands::init::InitArgs;
use super::commands::pattern::PatternArgs;
use super::commands::serve::ServeArgs;

#[derive(Parser, Debug)]
#[command(name = "prediction-patterns")]
#[command(about = "Learn where human forecasters beat the AI and adjust its confidence", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the project config and database
    Init(InitArgs),

    /// Import host predictions from a JSON file
    Import(ImportArgs),

    /// Run one learning pass now
    Run,

    /// Run learning passes on the configured interval until interrupted
    Serve(ServeArgs),

    /// Show the digest of all learned patterns
    Summary,

    /// Inspect learned patterns
    Pattern(PatternArgs),
}
