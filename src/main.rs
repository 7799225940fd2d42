//! Prediction patterns CLI entry point.

use clap::Parser;

use prediction_patterns::cli::{self, commands, Cli, Commands};
use prediction_patterns::infrastructure::config::ConfigLoader;
use prediction_patterns::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(err) => cli::handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => cli::handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &config, cli.json).await,
        Commands::Import(args) => commands::import::execute(args, &config, cli.json).await,
        Commands::Run => commands::run::execute(&config, cli.json).await,
        Commands::Serve(args) => commands::serve::execute(args, &config, cli.json).await,
        Commands::Summary => commands::summary::execute(&config, cli.json).await,
        Commands::Pattern(args) => commands::pattern::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        cli::handle_error(err, cli.json);
    }
}
