//! Tracing subscriber setup.
//!
//! Logs go to stderr, or to the configured file through a non-blocking
//! writer. The filter comes from `COMMUNITY_LOG`, else the configured level.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::config::LogConfig;

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "COMMUNITY_LOG";

/// Builds the filter: `COMMUNITY_LOG` if set, else `level`.
///
/// # Errors
/// Returns an error if the directive cannot be parsed.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match std::env::var(LOG_ENV) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(directive.trim())
            .with_context(|| format!("Invalid {LOG_ENV} filter '{directive}'")),
        _ => EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{level}'")),
    }
}

/// Installs the global subscriber.
///
/// Returns the writer guard when logging to a file; keep it alive until exit
/// so buffered lines are flushed. Calling this twice is harmless: the second
/// subscriber is not installed.
///
/// # Errors
/// Returns an error if the filter is invalid or the log file cannot be opened.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(&config.level)?;

    let Some(path) = &config.file else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
        return Ok(None);
    };

    let file = open_log_file(path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    tracing::debug!(path = %path.display(), "file logging enabled");
    Ok(Some(guard))
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
