use crate::{
    constants::{
        DATASET_FILE_EXTENSION, DATASET_FILE_PREFIX, DATE_FORMAT, LOG_FILE_EXTENSION,
        LOG_FILE_PREFIX,
    },
    settings::OutputSettings,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

/// Dataset file for `date`, e.g. `data/speedtest_results_2024-03-01.csv`
pub fn dataset_path(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir.join(format!(
        "{DATASET_FILE_PREFIX}{}.{DATASET_FILE_EXTENSION}",
        date.format(DATE_FORMAT)
    ))
}

/// Log file for `date`, e.g. `logs/speedtest_log_2024-03-01.txt`
pub fn log_path(log_dir: &Path, date: NaiveDate) -> PathBuf {
    log_dir.join(format!(
        "{LOG_FILE_PREFIX}{}.{LOG_FILE_EXTENSION}",
        date.format(DATE_FORMAT)
    ))
}

/// The pair of files a single cycle writes to, fixed at cycle start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPaths {
    pub date: NaiveDate,
    pub dataset: PathBuf,
    pub log: PathBuf,
}

impl DailyPaths {
    pub fn new(output: &OutputSettings, date: NaiveDate) -> Self {
        Self {
            date,
            dataset: dataset_path(&output.data_dir, date),
            log: log_path(&output.log_dir, date),
        }
    }

    /// Create the log and dataset directories if missing
    pub fn ensure_dirs(&self) -> Result<()> {
        for file in [&self.log, &self.dataset] {
            if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
                create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }
}
