use anyhow::Result;
use clap::Parser;
use speedtest_logger::{
    runner::Runner,
    schedule::{ScheduleOption, run_scheduled},
    settings::Settings,
    utility::SpeedtestCli,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "speedtest-logger",
    about = "Run a network speed test and append the result to today's CSV dataset",
    version,
    author,
    after_help = r#"Configuration:
    Configuration can be provided via:
    1. Environment variables with SPEEDTEST__ prefix (e.g., SPEEDTEST__UTILITY__PATH)
    2. .env file in the current directory
    3. Config file with -c option

Output:
    data/speedtest_results_<yyyy-MM-dd>.csv   one row per test
    logs/speedtest_log_<yyyy-MM-dd>.txt       one line per event

Examples:
    # One test, e.g. from an hourly cron entry
    speedtest-logger

    # Stay resident and test every hour
    speedtest-logger --schedule 1h"#
)]
pub struct Cli {
    /// Path to the configuration file (TOML format)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub schedule: ScheduleOption,
}

impl Cli {
    /// Load settings and apply CLI overrides (if any)
    fn load_settings(&self) -> Result<Settings> {
        let mut settings = if let Some(config_path) = &self.config {
            Settings::from_path(config_path)?
        } else {
            Settings::from_env()?
        };

        if let Some(log_level) = &self.log_level {
            settings.log_level = log_level.clone();
            settings.validate()?;
        }
        Ok(settings)
    }

    pub async fn run(self) -> Result<()> {
        let settings = self.load_settings()?;
        init_logging(&settings.log_level)?;
        info!("{settings}");

        let runner = Runner::new(SpeedtestCli::new(&settings.utility), settings.output);

        match self.schedule.schedule.as_deref() {
            Some(interval) => run_scheduled(runner, interval).await,
            None => {
                let outcome = runner.run_cycle().await?;
                info!(?outcome, "cycle finished");
                Ok(())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run().await
}

fn init_logging(log_level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
