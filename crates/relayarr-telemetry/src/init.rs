//! Telemetry initialisation primitives and logging configuration.
//!
//! # Design
//! - Centralises logging setup (fmt or JSON) with a single entry point.
//! - Optional second layer writes a daily-rolling, ANSI-free log file.
//! - Records the build version once so spans can carry it.

use std::path::Path;

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Default logging target when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File name prefix of the rolling log file.
pub const LOG_FILE_PREFIX: &str = "relayarr.log";

static BUILD_VERSION: OnceCell<String> = OnceCell::new();

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Filter directive (e.g., `info`, `debug`); `RUST_LOG` takes precedence.
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Directory for the rolling log file; `None` logs to stdout only.
    pub file_directory: Option<&'a Path>,
    /// Version recorded on event spans.
    pub build_version: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::Pretty,
            file_directory: None,
            build_version: build_version(),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable logs.
    Pretty,
}

/// Keeps the background file writer alive; drop it last so buffered lines are flushed.
#[derive(Debug)]
#[must_use]
pub struct TelemetryGuard {
    file: Option<WorkerGuard>,
}

impl TelemetryGuard {
    /// Whether a file layer is active.
    #[must_use]
    pub const fn writes_file(&self) -> bool {
        self.file.is_some()
    }
}

/// Access the build version recorded during logging initialisation.
#[must_use]
pub fn build_version() -> &'static str {
    BUILD_VERSION.get().map_or("dev", String::as_str)
}

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the tracing subscriber
/// cannot be installed (for example, because another subscriber has already been set).
pub fn init_logging(config: &LoggingConfig) -> Result<TelemetryGuard> {
    let (file_layer, file_guard) = match config.file_directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).map_err(|source| TelemetryError::LogDirectory {
                path: directory.to_path_buf(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(format_layer(config.format, writer, false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(format_layer(config.format, std::io::stdout, true))
        .with(file_layer)
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall { source })?;

    BUILD_VERSION
        .set(config.build_version.to_string())
        .ok()
        .or(Some(()));
    Ok(TelemetryGuard { file: file_guard })
}

fn format_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_ansi(ansi)
        .with_writer(writer);
    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.boxed(),
    }
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
