//! Log file setup
//!
//! Everything goes to `app.log` in the data directory. The level comes from
//! `LOG_LEVEL` and defaults to errors only.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level as TraceLevel;
use tracing_subscriber::FmtSubscriber;

use crate::constants::logging::{DEFAULT_LEVEL, LEVEL_ENV};
use crate::constants::paths::LOG_FILENAME;

pub fn parse_level(raw: Option<&str>) -> TraceLevel {
    match raw.unwrap_or(DEFAULT_LEVEL).trim().to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "info" => TraceLevel::INFO,
        "warn" | "warning" => TraceLevel::WARN,
        _ => TraceLevel::ERROR,
    }
}

pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILENAME)
}

/// Install the global subscriber writing to `<data_dir>/app.log`
pub fn init(data_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .context(format!("Failed to create data directory: {}", data_dir.display()))?;

    let path = log_path(data_dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .context(format!("Failed to open log file: {}", path.display()))?;

    let level = parse_level(std::env::var(LEVEL_ENV).ok().as_deref());
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    Ok(path)
}
