use crate::{error::UtilityError, settings::UtilitySettings};
use async_trait::async_trait;
use mockall::automock;
use std::{path::PathBuf, time::Duration};
use tokio::{process::Command, time::timeout};
use tracing::{debug, warn};

/// Anything that can run one speed test and hand back its raw CSV output.
#[automock]
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    async fn measure(&self) -> Result<String, UtilityError>;
}

/// The external speed test binary, run with its CSV output flag.
#[derive(Debug, Clone)]
pub struct SpeedtestCli {
    path: PathBuf,
    csv_flag: String,
    timeout: Duration,
}

impl SpeedtestCli {
    pub fn new(settings: &UtilitySettings) -> Self {
        Self {
            path: settings.path.clone(),
            csv_flag: settings.csv_flag.clone(),
            timeout: settings.timeout(),
        }
    }
}

#[async_trait]
impl MeasurementSource for SpeedtestCli {
    async fn measure(&self) -> Result<String, UtilityError> {
        debug!(path = %self.path.display(), flag = %self.csv_flag, "invoking measurement utility");

        let mut command = Command::new(&self.path);
        command.arg(&self.csv_flag).kill_on_drop(true);

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| UtilityError::TimedOut {
                path: self.path.clone(),
                after: self.timeout,
            })?
            .map_err(|source| UtilityError::Spawn {
                path: self.path.clone(),
                source,
            })?;

        if !output.status.success() {
            warn!(status = %output.status, "measurement utility exited unsuccessfully");
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!(stderr = %stderr.trim(), "measurement utility wrote to stderr");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
