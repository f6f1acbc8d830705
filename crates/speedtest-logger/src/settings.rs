use anyhow::{Context, Result, bail};
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

/// Settings for the speed test logger.
///
/// Every key has a default so the binary runs with no config file and no
/// environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Console log filter (e.g., "info", "debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Measurement utility invocation
    #[serde(default)]
    pub utility: UtilitySettings,
    /// Where the daily files go
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilitySettings {
    /// Path to the speed test binary
    pub path: PathBuf,
    /// The single flag that switches the utility to comma-separated output
    pub csv_flag: String,
    /// Seconds to wait before the utility is killed
    pub timeout_secs: u64,
}

impl Default for UtilitySettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./speedtest"),
            csv_flag: "--format=csv".to_string(),
            timeout_secs: 300,
        }
    }
}

impl UtilitySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub log_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Settings {
    /// Load from a config file; env vars still take priority
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(Some(path.as_ref()), env_source())
    }

    /// Load from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self> {
        // NOTE: a missing .env is fine
        let _ = dotenvy::dotenv();
        Self::load(None, env_source())
    }

    fn load(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(&path.to_string_lossy()));
        }

        let settings: Settings = builder
            .add_source(env)
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.utility.path.as_os_str().is_empty() {
            bail!("Utility path cannot be empty");
        }
        if self.utility.csv_flag.trim().is_empty() {
            bail!("Utility csv_flag cannot be empty");
        }
        if self.utility.timeout_secs == 0 {
            bail!("Utility timeout_secs must be greater than 0");
        }
        if self.output.log_dir.as_os_str().is_empty() {
            bail!("Output log_dir cannot be empty");
        }
        if self.output.data_dir.as_os_str().is_empty() {
            bail!("Output data_dir cannot be empty");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            bail!(
                "Invalid log level '{}'. Valid options are: {:?}",
                self.log_level,
                valid_log_levels
            );
        }

        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("SPEEDTEST")
        .separator("__")
        .try_parsing(true)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings {{\n\
             \tLog Level: {}\n\
             \tUtility: {} {}\n\
             \tTimeout: {}s\n\
             \tLog Dir: {}\n\
             \tData Dir: {}\n\
             }}",
            self.log_level,
            self.utility.path.display(),
            self.utility.csv_flag,
            self.utility.timeout_secs,
            self.output.log_dir.display(),
            self.output.data_dir.display(),
        )
    }
}
