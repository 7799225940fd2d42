//! Implementation of the `serve` command.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use crate::domain::models::Config;
use crate::services::SchedulerEvent;

use super::open_engine;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Minutes between runs (overrides scheduler.interval_minutes)
    #[arg(long)]
    pub interval_minutes: Option<u64>,

    /// Skip the run normally fired at startup
    #[arg(long)]
    pub no_startup_run: bool,
}

pub async fn execute(args: ServeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let mut config = config.clone();
    if let Some(minutes) = args.interval_minutes {
        anyhow::ensure!(minutes >= 1, "--interval-minutes must be at least 1");
        config.scheduler.interval_minutes = minutes;
    }
    if args.no_startup_run {
        config.scheduler.run_on_startup = false;
    }

    let engine = open_engine(&config).await?;
    engine.scheduler().on_event(move |event| log_event(event, json_mode));

    let handle = engine.start()?;
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown requested, waiting for the scheduler to stop");
    handle.stop();
    handle.join().await;

    // Let an in-progress run finish its merge before exiting.
    while engine.status().await.in_flight {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Ok(())
}

fn log_event(event: &SchedulerEvent, json_mode: bool) {
    match event {
        SchedulerEvent::Started { interval } => {
            info!(interval_secs = interval.as_secs(), "Serving pattern learning");
        }
        SchedulerEvent::RunStarted { run_number, trigger } => {
            info!(run_number, ?trigger, "Learning run started");
        }
        SchedulerEvent::RunCompleted { run_number, report } => {
            if json_mode {
                println!("{}", serde_json::to_string(report).unwrap_or_default());
            }
            info!(
                run_number,
                patterns_updated = report.patterns_updated,
                skipped = report.skipped,
                deferred = report.deferred,
                "Learning run finished"
            );
        }
        SchedulerEvent::RunFailed { run_number, error } => {
            warn!(run_number, %error, "Learning run failed, will retry on next tick");
        }
        SchedulerEvent::RunDropped { trigger } => {
            warn!(?trigger, "Previous run still in progress, skipped this tick");
        }
        SchedulerEvent::Stopped => info!("Scheduler stopped"),
    }
}
