//! Run a network speed test and keep the results.
//!
//! One cycle invokes the external speed test utility in CSV mode, parses its
//! output into [`record::MeasurementRecord`]s, appends them to the day's
//! dataset file and writes what happened to the day's run log:
//!
//! ```text
//! data/speedtest_results_<yyyy-MM-dd>.csv
//! logs/speedtest_log_<yyyy-MM-dd>.txt
//! ```
//!
//! [`runner::Runner`] drives a cycle against any [`utility::MeasurementSource`];
//! [`utility::SpeedtestCli`] is the real one. [`schedule`] keeps the process
//! resident and runs a cycle per interval.

pub mod constants;
pub mod dataset;
mod error;
pub mod paths;
pub mod record;
pub mod run_log;
pub mod runner;
pub mod schedule;
pub mod settings;
pub mod utility;

pub use error::{ParseError, UtilityError};
