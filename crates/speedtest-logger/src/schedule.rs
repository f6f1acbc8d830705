//! Resident mode: keep the process alive and run a cycle on a fixed interval.
//!
//! Without `--schedule` the binary runs exactly one cycle and exits, leaving
//! the cadence to cron or the OS task scheduler.

use crate::{runner::Runner, utility::MeasurementSource};
use anyhow::{Result, bail};
use clap::Args;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::signal;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Interval option, flattened into the CLI.
#[derive(Debug, Args, Clone, Default)]
pub struct ScheduleOption {
    /// Run a cycle on this interval (e.g. '30s', '10m', '1h') instead of once
    #[arg(long, value_name = "INTERVAL")]
    pub schedule: Option<String>,
}

impl ScheduleOption {
    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }
}

/// Parse "30s", "10m", "1h" or a bare number of seconds
pub fn parse_interval(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let (digits, unit_secs) = match s.char_indices().last() {
        Some((idx, 's')) => (&s[..idx], 1),
        Some((idx, 'm')) => (&s[..idx], 60),
        Some((idx, 'h')) => (&s[..idx], 3600),
        _ => (s.as_str(), 1),
    };

    let count: u64 = match digits.trim().parse() {
        Ok(count) => count,
        Err(_) => bail!("Invalid schedule interval '{s}'"),
    };
    if count == 0 {
        bail!("Schedule interval must be greater than zero");
    }

    Ok(Duration::from_secs(count * unit_secs))
}

/// Cron expression (with seconds) that fires every `interval`.
///
/// The interval must be expressible as a single cron step: whole seconds
/// under a minute, whole minutes under an hour, or whole hours under a day.
pub fn interval_to_cron(interval: Duration) -> Result<String> {
    let secs = interval.as_secs();
    match secs {
        0 => bail!("Schedule interval must be greater than zero"),
        1..60 => Ok(format!("*/{secs} * * * * *")),
        60..3600 if secs % 60 == 0 => Ok(format!("0 */{} * * * *", secs / 60)),
        3600..86400 if secs % 3600 == 0 => Ok(format!("0 0 */{} * * *", secs / 3600)),
        86400.. => bail!("Schedule interval must be less than 24 hours, got {secs}s"),
        _ => bail!("Schedule interval {secs}s is not a whole number of minutes or hours"),
    }
}

/// Run one cycle now, then one per tick until Ctrl+C or SIGTERM.
///
/// A tick that fires while the previous cycle is still running is skipped.
pub async fn run_scheduled<S>(runner: Runner<S>, interval: &str) -> Result<()>
where
    S: MeasurementSource + 'static,
{
    let cron_expr = interval_to_cron(parse_interval(interval)?)?;
    let guarded = Arc::new(GuardedRunner::new(runner));
    let shutdown = shutdown_signal()?;

    guarded.run_if_idle().await;

    let job = Job::new_async(cron_expr.as_str(), {
        let guarded = guarded.clone();
        move |_uuid, _lock| {
            let guarded = guarded.clone();
            Box::pin(async move {
                guarded.run_if_idle().await;
            })
        }
    })?;

    let sched = JobScheduler::new().await?;
    sched.add(job).await?;
    sched.start().await?;

    info!(interval, cron = %cron_expr, "scheduler started");
    info!("Press Ctrl+C to stop...");

    shutdown.await?;
    info!("Shutting down...");

    Ok(())
}

/// A runner that refuses to start a cycle while one is in flight
struct GuardedRunner<S> {
    runner: Runner<S>,
    busy: AtomicBool,
}

impl<S: MeasurementSource> GuardedRunner<S> {
    fn new(runner: Runner<S>) -> Self {
        Self {
            runner,
            busy: AtomicBool::new(false),
        }
    }

    /// Run a cycle unless one is already running; returns whether it ran
    async fn run_if_idle(&self) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("previous cycle still running, skipping this tick");
            return false;
        }

        match self.runner.run_cycle().await {
            Ok(outcome) => info!(?outcome, "cycle finished"),
            Err(e) => error!("cycle failed: {e:#}"),
        }

        self.busy.store(false, Ordering::Release);
        true
    }
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// Handlers are installed when this is called, not when the future is first
/// polled.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = Result<()>>> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("SIGTERM received"),
            result = signal::ctrl_c() => result?,
        }
        Ok(())
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = Result<()>>> {
    Ok(async {
        signal::ctrl_c().await?;
        Ok(())
    })
}
