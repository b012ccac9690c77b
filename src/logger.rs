//! Logging setup.
//!
//! Library code logs through the `log` macros; the binary installs a `fern`
//! dispatcher here. With file logging enabled, lines go to
//! `<data_dir>/tasksync/tasksync.log` at the configured level; otherwise only
//! warnings and errors reach stderr.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::LevelFilter;

use crate::config::LoggingConfig;

/// Parse a configured level name.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level.trim()).map_err(|_| anyhow::anyhow!("Invalid log level '{level}'"))
}

/// Location of the log file
pub fn get_log_file_path() -> Result<PathBuf> {
    dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
        .map(|dir| dir.join("tasksync").join("tasksync.log"))
}

fn base_dispatch(level: LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {:<5} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // Database drivers are chatty below warn
        .level_for("sqlx", LevelFilter::Warn)
        .level_for("sea_orm", LevelFilter::Warn)
}

/// Install the global logger.
///
/// # Returns
/// The log file path when file logging is enabled
///
/// # Errors
/// Fails if the level is invalid, the log file cannot be opened, or a logger is
/// already installed
pub fn init(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    if !config.enabled {
        base_dispatch(LevelFilter::Warn)
            .chain(std::io::stderr())
            .apply()
            .context("Failed to install logger")?;
        return Ok(None);
    }

    let level = parse_level(&config.level)?;
    let path = get_log_file_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = fern::log_file(&path).with_context(|| format!("Failed to open log file: {}", path.display()))?;

    base_dispatch(level)
        .chain(file)
        .apply()
        .context("Failed to install logger")?;

    log::info!("📝 Logging to {}", path.display());
    Ok(Some(path))
}
