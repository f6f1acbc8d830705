use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// Failures to obtain output from the measurement utility.
#[derive(Debug, Error)]
pub enum UtilityError {
    #[error("failed to invoke {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} did not finish within {}s", path.display(), after.as_secs())]
    TimedOut { path: PathBuf, after: Duration },
}

/// Output that is present but does not have the shape of utility records.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed delimited output: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },
}
