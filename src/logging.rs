//! Logging setup for the host binary.
//!
//! Events go to a file when one is given or when the terminal window owns
//! the tty, and to stderr otherwise. `RUST_LOG` overrides the default
//! filter.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LogError {
    /// The log file could not be created.
    #[error("log file: {0}")]
    Io(#[from] std::io::Error),

    /// The filter directive did not parse.
    #[error("log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber is already installed.
    #[error("logging already initialised: {0}")]
    Init(String),
}

/// Log file used when the terminal window owns the tty and none was given.
pub const TERMINAL_LOG_FILE: &str = "spritelink.log";

/// Where events should go: `log_file` if given, [`TERMINAL_LOG_FILE`] if
/// the tty is taken by the window, else `None` for stderr.
pub fn log_path(log_file: Option<&Path>, tty_owned: bool) -> Option<PathBuf> {
    match log_file {
        Some(path) => Some(path.to_path_buf()),
        None if tty_owned => Some(PathBuf::from(TERMINAL_LOG_FILE)),
        None => None,
    }
}

/// Default filter: crate events at `level`, device text at `info`.
pub fn default_filter(level: tracing::Level) -> String {
    format!("spritelink={},device=info", level.as_str().to_lowercase())
}

fn filter(level: tracing::Level) -> Result<EnvFilter, LogError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => Ok(EnvFilter::builder().parse(directives)?),
        _ => Ok(EnvFilter::builder().parse(default_filter(level))?),
    }
}

/// Install the global subscriber, writing to `log_file` or stderr.
pub fn init(level: tracing::Level, log_file: Option<&Path>) -> Result<(), LogError> {
    let filter = filter(level)?;

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        let layer = fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_thread_names(true)
            .with_target(true)
            .with_ansi(false)
            .with_filter(filter);
        tracing_subscriber::registry()
            .with(layer)
            .try_init()
            .map_err(|e| LogError::Init(e.to_string()))
    } else {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_thread_names(true)
            .with_target(true)
            .with_filter(filter);
        tracing_subscriber::registry()
            .with(layer)
            .try_init()
            .map_err(|e| LogError::Init(e.to_string()))
    }
}
