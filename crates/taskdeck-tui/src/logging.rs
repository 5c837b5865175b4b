use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Get the path to the log file
pub fn log_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .context("Could not find cache directory")?
        .join("taskdeck");

    fs::create_dir_all(&cache_dir).context("Could not create cache directory")?;

    Ok(cache_dir.join("taskdeck.log"))
}

/// The terminal belongs to the UI, so logs go to a file.
pub fn init() -> Result<PathBuf> {
    let path = log_path()?;
    let file = File::create(&path).context("Could not create log file")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("TASKDECK_LOG")
                .unwrap_or_else(|_| "taskdeck=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(path)
}
