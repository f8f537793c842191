//! Tracing subscriber setup shared by medrag binaries
//!
//! Logs always go to stderr so stdout stays reserved for chunk output.
//! An optional log directory adds a daily-rotated file next to it.

use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

/// File name prefix for rolling log files
const LOG_FILE_PREFIX: &str = "medrag.log";

/// Options controlling subscriber construction
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Default filter directive when `RUST_LOG` is unset (e.g. "info")
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Also write to a daily-rotated file in this directory
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_dir: None,
        }
    }
}

/// Writer guards that must outlive the program's logging
///
/// Dropping these flushes and stops the background writer threads.
pub struct LogGuards {
    _stderr: WorkerGuard,
    _file: Option<WorkerGuard>,
}

/// Build the filter, preferring `RUST_LOG` over the configured level
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global tracing subscriber
///
/// # Errors
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_tracing(options: &LoggingOptions) -> anyhow::Result<LogGuards> {
    let (stderr_writer, stderr_guard): (NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(std::io::stderr());

    let (writer, file_guard) = if let Some(log_dir) = &options.log_dir {
        std::fs::create_dir_all(log_dir)?;
        let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        (
            BoxMakeWriter::new(stderr_writer.and(file_writer)),
            Some(file_guard),
        )
    } else {
        (BoxMakeWriter::new(stderr_writer), None)
    };

    let builder = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(build_filter(&options.level));

    let installed = if options.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    Ok(LogGuards {
        _stderr: stderr_guard,
        _file: file_guard,
    })
}
