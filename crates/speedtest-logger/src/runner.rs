use crate::{
    dataset::{self, WriteMode},
    error::UtilityError,
    paths::DailyPaths,
    record::{UTILITY_FIELD_COUNT, parse_output},
    run_log::RunLog,
    settings::OutputSettings,
    utility::MeasurementSource,
};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use tracing::debug;

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The utility printed nothing
    NoOutput,
    /// Output was present but held no records
    ParseEmpty,
    /// Output was not delimited records; logged with the raw text
    ParseFailed,
    /// The utility was killed after the configured timeout
    TimedOut,
    /// Records were written to the dataset
    Persisted { rows: usize, mode: WriteMode },
}

/// Runs measurement-collect-persist cycles against the daily files.
pub struct Runner<S> {
    source: S,
    output: OutputSettings,
}

impl<S: MeasurementSource> Runner<S> {
    pub fn new(source: S, output: OutputSettings) -> Self {
        Self { source, output }
    }

    /// Run one cycle against today's files
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        self.run_cycle_on(Local::now().date_naive()).await
    }

    /// Run one cycle against the files for `date`.
    ///
    /// Only utility output problems and timeouts end the cycle cleanly; a
    /// utility that cannot be started and any filesystem failure are returned
    /// as errors.
    pub async fn run_cycle_on(&self, date: NaiveDate) -> Result<CycleOutcome> {
        let paths = DailyPaths::new(&self.output, date);
        paths.ensure_dirs()?;

        let log = RunLog::open(&paths.log)?;
        log.info("Starting speed test")?;

        let raw = match self.source.measure().await {
            Ok(raw) => raw,
            Err(UtilityError::TimedOut { after, .. }) => {
                log.error(format!("Speed test timed out after {}s", after.as_secs()))?;
                return Ok(CycleOutcome::TimedOut);
            }
            Err(err) => {
                log.error(format!("Failed to run speed test: {err}"))?;
                return Err(err.into());
            }
        };

        if raw.trim().is_empty() {
            log.warn("Speed test produced no output")?;
            return Ok(CycleOutcome::NoOutput);
        }

        let parsed = match parse_output(&raw, Local::now().naive_local()) {
            Ok(parsed) => parsed,
            Err(err) => {
                log.error(format!("Error parsing speed test output: {err}"))?;
                for line in raw.lines() {
                    log.error(format!("Raw output: {line}"))?;
                }
                return Ok(CycleOutcome::ParseFailed);
            }
        };

        for rejected in &parsed.rejected {
            log.warn(format!(
                "Skipped output line {}: expected {UTILITY_FIELD_COUNT} fields, found {}",
                rejected.line, rejected.found
            ))?;
        }

        if parsed.records.is_empty() {
            log.warn("Speed test output could not be converted to records")?;
            return Ok(CycleOutcome::ParseEmpty);
        }

        let rows = parsed.records.len();
        let mode = dataset::persist(&paths.dataset, &parsed.records)?;
        match mode {
            WriteMode::Created => log.info(format!(
                "Created new file {} with {rows} record(s)",
                paths.dataset.display()
            ))?,
            WriteMode::Appended => log.info(format!(
                "Appended {rows} record(s) to existing file {}",
                paths.dataset.display()
            ))?,
        }

        debug!(%date, rows, ?mode, "cycle complete");
        Ok(CycleOutcome::Persisted { rows, mode })
    }
}
