//! Logging and tracing configuration
//!
//! The harness logs to stderr and, when a log directory is given, to
//! `<logs>/assess.log` so the run's artifacts carry the harness output too.

use std::path::PathBuf;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths::{self, LOG_FILE_NAME};

/// Logging setup, applied once at process start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for this crate's events
    pub level: Level,
    /// Directory receiving the log file
    pub log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    /// Map the harness `--verbose` flag to a level
    pub fn for_run(verbose: bool, log_dir: Option<PathBuf>) -> Self {
        let level = if verbose { Level::DEBUG } else { Level::INFO };
        Self { level, log_dir }
    }

    fn default_directives(&self) -> String {
        format!("juju_assess={},warn", self.level.as_str().to_ascii_lowercase())
    }
}

/// Initialize tracing
///
/// `RUST_LOG` overrides the configured level. Returns the log file path when
/// file logging could be set up.
pub fn init(config: &LoggingConfig) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    let (file_layer, log_path) = match config.log_dir.as_deref().map(open_log_file) {
        Some(Ok((appender, path))) => (
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
            Some(path),
        ),
        Some(Err(e)) => {
            eprintln!("Warning: file logging disabled: {e}");
            (None, None)
        }
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if let Some(dir) = &config.log_dir {
        tracing::debug!(log_dir = %dir.display(), "Logging initialized");
    }
    log_path
}

fn open_log_file(dir: &std::path::Path) -> std::io::Result<(RollingFileAppender, PathBuf)> {
    if paths::ensure_log_dir(dir)? {
        eprintln!(
            "Warning: log directory {} is not empty; earlier artifacts may be mixed in",
            dir.display()
        );
    }
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(dir)
        .map_err(std::io::Error::other)?;
    Ok((appender, dir.join(LOG_FILE_NAME)))
}
