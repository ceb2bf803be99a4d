//! Tracing subscriber setup: coloured console output plus an optional
//! per-day plain-text log file.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Path of the log file for the current local day.
pub fn daily_log_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}.log", chrono::Local::now().format("%Y-%m-%d")))
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. Fails if a subscriber is
/// already installed or the log directory cannot be created.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let console = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::ChronoLocal::new("%H:%M:%S".to_string()));

    let file = match &config.dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let path = daily_log_path(dir);
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_timer(fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
                    .with_writer(Arc::new(handle)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(console)
        .with(file)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
