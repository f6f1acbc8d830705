/// Date component of the daily file names
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Second-granularity timestamp used in the dataset and the run log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DATASET_FILE_PREFIX: &str = "speedtest_results_";
pub const DATASET_FILE_EXTENSION: &str = "csv";

pub const LOG_FILE_PREFIX: &str = "speedtest_log_";
pub const LOG_FILE_EXTENSION: &str = "txt";

/// Separator between the timestamp and the message of a run-log line
pub const LOG_LINE_SEPARATOR: &str = " - ";
