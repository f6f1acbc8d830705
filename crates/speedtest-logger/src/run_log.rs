use crate::constants::{LOG_LINE_SEPARATOR, TIMESTAMP_FORMAT};
use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

/// First line of every new log file
pub const CREATION_MARKER: &str = "Log file created";

/// The day's plain-text run log.
///
/// Each line is `yyyy-MM-dd HH:mm:ss - <message>`. A message spanning several
/// lines is written as several prefixed lines. Lines are mirrored to tracing
/// at the matching level.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Open the log at `path`, creating it with a creation marker if absent
    pub fn open(path: &Path) -> Result<Self> {
        let log = Self {
            path: path.to_path_buf(),
        };
        if !path.exists() {
            log.append(CREATION_MARKER)?;
        }
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: impl AsRef<str>) -> Result<()> {
        info!("{}", message.as_ref());
        self.append(message.as_ref())
    }

    pub fn warn(&self, message: impl AsRef<str>) -> Result<()> {
        warn!("{}", message.as_ref());
        self.append(message.as_ref())
    }

    pub fn error(&self, message: impl AsRef<str>) -> Result<()> {
        error!("{}", message.as_ref());
        self.append(message.as_ref())
    }

    fn append(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log file: {}", self.path.display()))?;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

        let mut text = String::new();
        for line in message.lines().chain(message.is_empty().then_some("")) {
            text.push_str(&timestamp);
            text.push_str(LOG_LINE_SEPARATOR);
            text.push_str(line);
            text.push('\n');
        }

        file.write_all(text.as_bytes())
            .with_context(|| format!("Failed to write log file: {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use std::fs;
    use tempfile::TempDir;

    fn split_line(line: &str) -> (NaiveDateTime, &str) {
        let (ts, message) = line.split_once(LOG_LINE_SEPARATOR).unwrap();
        (
            NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).unwrap(),
            message,
        )
    }

    #[test]
    fn test_new_log_gets_creation_marker() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.txt");

        RunLog::open(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(split_line(lines[0]).1, CREATION_MARKER);
    }

    #[test]
    fn test_existing_log_is_appended() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.txt");

        RunLog::open(&path).unwrap().info("first").unwrap();
        let log = RunLog::open(&path).unwrap();
        log.warn("second").unwrap();
        log.error("third").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().map(split_line).collect();
        let messages: Vec<_> = lines.iter().map(|(_, m)| *m).collect();
        assert_eq!(messages, vec![CREATION_MARKER, "first", "second", "third"]);
        assert!(lines.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_multi_line_message_prefixes_every_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.txt");

        let log = RunLog::open(&path).unwrap();
        log.error("first part\r\nsecond part\n").unwrap();
        log.info("").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let messages: Vec<_> = text.lines().map(|l| split_line(l).1).collect();
        assert_eq!(
            messages,
            vec![CREATION_MARKER, "first part", "second part", ""]
        );
    }
}
