//! Background scheduler for pattern learning runs.
//!
//! Fires a learning run on a fixed interval and on demand. At most one run is
//! in flight; ticks and manual triggers that arrive meanwhile are dropped and
//! reported. A failed run is recorded and the loop keeps ticking. Stopping the
//! scheduler prevents future ticks but lets a run in progress finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::SchedulerConfig;
use crate::services::learning_pipeline::{LearningPipeline, RunReport};

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Startup,
    Scheduled,
    Manual,
}

/// Event emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// Scheduler loop started.
    Started { interval: Duration },
    /// Run started.
    RunStarted { run_number: u64, trigger: RunTrigger },
    /// Run completed.
    RunCompleted { run_number: u64, report: RunReport },
    /// Run failed.
    RunFailed { run_number: u64, error: String },
    /// Trigger dropped because a run was already in flight.
    RunDropped { trigger: RunTrigger },
    /// Scheduler loop stopped.
    Stopped,
}

/// Why a manual trigger produced no report.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("A learning run is already in progress")]
    AlreadyRunning,

    #[error("Learning run failed: {0}")]
    Failed(#[from] DomainError),
}

/// Outcome of the most recent run, for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct LastRunStatus {
    pub run_number: u64,
    pub trigger: RunTrigger,
    pub success: bool,
    pub error: Option<String>,
    pub patterns_updated: usize,
    pub skipped: usize,
    pub deferred: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Status of the scheduler.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStatus {
    /// Whether the interval loop is running.
    pub running: bool,
    /// Whether a run is executing right now.
    pub in_flight: bool,
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub dropped_runs: u64,
    pub last_run: Option<LastRunStatus>,
}

type Listener = Arc<dyn Fn(&SchedulerEvent) + Send + Sync>;

struct SchedulerInner {
    pipeline: Arc<LearningPipeline>,
    run_on_startup: bool,
    in_flight: AtomicBool,
    status: RwLock<SchedulerStatus>,
    listeners: StdRwLock<Vec<Listener>>,
}

/// Clears the in-flight flag when a run ends, including by panic.
struct InFlightGuard(Arc<SchedulerInner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

/// Handle to control a started scheduler loop.
pub struct SchedulerHandle {
    stop_flag: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop future ticks. A run already in progress still completes.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Wait for the loop to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "Scheduler loop terminated abnormally");
        }
    }
}

/// Pattern learning scheduler.
#[derive(Clone)]
pub struct PatternScheduler {
    inner: Arc<SchedulerInner>,
}

impl PatternScheduler {
    pub fn new(pipeline: Arc<LearningPipeline>) -> Self {
        Self::build(pipeline, false)
    }

    /// Create with settings from configuration.
    pub fn with_config(pipeline: Arc<LearningPipeline>, config: &SchedulerConfig) -> Self {
        Self::build(pipeline, config.run_on_startup)
    }

    fn build(pipeline: Arc<LearningPipeline>, run_on_startup: bool) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                pipeline,
                run_on_startup,
                in_flight: AtomicBool::new(false),
                status: RwLock::new(SchedulerStatus::default()),
                listeners: StdRwLock::new(Vec::new()),
            }),
        }
    }

    /// Register a callback invoked for every event. Callbacks run inline and must not block.
    pub fn on_event(&self, listener: impl Fn(&SchedulerEvent) + Send + Sync + 'static) {
        if let Ok(mut listeners) = self.inner.listeners.write() {
            listeners.push(Arc::new(listener));
        }
    }

    /// Receive events on a channel.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SchedulerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.on_event(move |event| {
            let _ = tx.send(event.clone());
        });
        rx
    }

    /// Start the interval loop.
    ///
    /// # Errors
    /// Returns `DomainError::ValidationFailed` for a zero interval.
    pub fn start(&self, every: Duration) -> DomainResult<SchedulerHandle> {
        if every.is_zero() {
            return Err(DomainError::ValidationFailed(
                "scheduler interval must be greater than zero".to_string(),
            ));
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_notify = Arc::new(Notify::new());
        let scheduler = self.clone();
        let task = tokio::spawn(scheduler.run_loop(every, stop_flag.clone(), stop_notify.clone()));

        Ok(SchedulerHandle {
            stop_flag,
            stop_notify,
            task,
        })
    }

    /// Run once now. Dropped with `TriggerError::AlreadyRunning` if a run is in flight.
    pub async fn run_once(&self) -> Result<RunReport, TriggerError> {
        self.trigger(RunTrigger::Manual).await
    }

    /// Get current status.
    pub async fn status(&self) -> SchedulerStatus {
        let mut status = self.inner.status.read().await.clone();
        status.in_flight = self.inner.in_flight.load(Ordering::Acquire);
        status
    }

    async fn run_loop(self, every: Duration, stop_flag: Arc<AtomicBool>, stop_notify: Arc<Notify>) {
        self.inner.status.write().await.running = true;
        self.emit(&SchedulerEvent::Started { interval: every });
        info!(interval_secs = every.as_secs(), "Pattern scheduler started");

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        if self.inner.run_on_startup {
            self.fire(RunTrigger::Startup);
        }

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    self.fire(RunTrigger::Scheduled);
                }
                () = stop_notify.notified() => {}
            }

            if stop_flag.load(Ordering::Acquire) {
                break;
            }
        }

        self.inner.status.write().await.running = false;
        self.emit(&SchedulerEvent::Stopped);
        info!("Pattern scheduler stopped");
    }

    /// Fire-and-forget trigger used by the loop.
    fn fire(&self, trigger: RunTrigger) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            // Outcomes are recorded in status and events.
            let _ = scheduler.trigger(trigger).await;
        });
    }

    async fn trigger(&self, trigger: RunTrigger) -> Result<RunReport, TriggerError> {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.inner.status.write().await.dropped_runs += 1;
            warn!(?trigger, "Learning run already in progress, dropping trigger");
            self.emit(&SchedulerEvent::RunDropped { trigger });
            return Err(TriggerError::AlreadyRunning);
        }

        let guard = InFlightGuard(self.inner.clone());
        let run_number = {
            let mut status = self.inner.status.write().await;
            status.total_runs += 1;
            status.total_runs
        };
        self.emit(&SchedulerEvent::RunStarted { run_number, trigger });

        // The run owns the in-flight guard, so it keeps running (and keeps
        // the slot) even if the caller stops waiting for it.
        let pipeline = self.inner.pipeline.clone();
        let started_at = Utc::now();
        let task = tokio::spawn(async move {
            let _guard = guard;
            pipeline.run().await
        });

        let result = match task.await {
            Ok(result) => result,
            Err(join_error) => Err(DomainError::RunAborted(join_error.to_string())),
        };

        self.record(run_number, trigger, started_at, &result).await;
        result.map_err(TriggerError::Failed)
    }

    async fn record(
        &self,
        run_number: u64,
        trigger: RunTrigger,
        started_at: DateTime<Utc>,
        result: &Result<RunReport, DomainError>,
    ) {
        {
            let mut status = self.inner.status.write().await;
            let last_run = match result {
                Ok(report) => {
                    status.successful_runs += 1;
                    LastRunStatus {
                        run_number,
                        trigger,
                        success: true,
                        error: None,
                        patterns_updated: report.patterns_updated,
                        skipped: report.skipped,
                        deferred: report.deferred,
                        started_at,
                        finished_at: report.finished_at,
                    }
                }
                Err(err) => {
                    status.failed_runs += 1;
                    LastRunStatus {
                        run_number,
                        trigger,
                        success: false,
                        error: Some(err.to_string()),
                        patterns_updated: 0,
                        skipped: 0,
                        deferred: 0,
                        started_at,
                        finished_at: Utc::now(),
                    }
                }
            };
            status.last_run = Some(last_run);
        }

        match result {
            Ok(report) => self.emit(&SchedulerEvent::RunCompleted {
                run_number,
                report: report.clone(),
            }),
            Err(err) => {
                error!(run_number, error = %err, "Learning run failed");
                self.emit(&SchedulerEvent::RunFailed {
                    run_number,
                    error: err.to_string(),
                });
            }
        }
    }

    fn emit(&self, event: &SchedulerEvent) {
        let listeners = match self.inner.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(event);
        }
    }
}
