//! The logging context handed to application code
//!
//! A [`Logger`] owns a `tracing` dispatcher with four sinks attached:
//!
//! | sink | accepts |
//! |---|---|
//! | `log.txt` (rotating) | debug and above |
//! | `errors.txt` (rotating) | error and above |
//! | console stdout | `console_level` up to warning |
//! | console stderr | error and above |
//!
//! Loggers are independent of each other until one is installed as the
//! process-wide default.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{Dispatch, Subscriber};
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::fmt::format::DefaultFields;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

use super::console::ConsoleSink;
use super::format::RecordFormat;
use super::level::Severity;
use super::rotating::RotatingFile;
use super::sink::{RecordSink, SinkWriter};
use super::stream::StreamAdapter;
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};

/// Target of every event emitted through a [`Logger`]
pub const TARGET: &str = "tagged_logger";

/// Rendered in place of the error when `error` is called without one
const NO_ERROR: &str = "None";

/// Cheaply cloneable handle to a configured logging pipeline
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    app_name: String,
    output_directory: PathBuf,
    log_path: PathBuf,
    error_log_path: PathBuf,
    dispatch: Dispatch,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("app_name", &self.inner.app_name)
            .field("output_directory", &self.inner.output_directory)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Build a logger whose console sinks write to the process's stdout/stderr
    pub fn new(config: &LoggerConfig) -> Result<Self> {
        Self::with_consoles(config, ConsoleSink::stdout(), ConsoleSink::stderr())
    }

    /// Build a logger with explicit console sinks
    ///
    /// The output directory is created first, then both file sinks are
    /// opened. Any failure aborts construction.
    pub fn with_consoles(
        config: &LoggerConfig,
        stdout: ConsoleSink,
        stderr: ConsoleSink,
    ) -> Result<Self> {
        fs::create_dir_all(&config.output_directory).map_err(|source| {
            LoggerError::CreateDirectory {
                path: config.output_directory.clone(),
                source,
            }
        })?;

        let format = RecordFormat::new(&config.app_name);

        let log_path = config.log_path();
        let log_file = open_sink(&log_path, config.file_max_bytes, config.file_backup_count)?;

        let error_log_path = config.error_log_path();
        let error_file = open_sink(
            &error_log_path,
            config.file_max_bytes,
            config.error_backup_count,
        )?;

        let console_level = config.console_level;
        let stdout_filter = filter_fn(move |metadata| {
            let severity = Severity::from(*metadata.level());
            severity >= console_level && severity <= Severity::Warning
        });

        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::DEBUG)
            .with(sink_layer(&format, log_file).with_filter(LevelFilter::DEBUG))
            .with(sink_layer(&format, error_file).with_filter(LevelFilter::ERROR))
            .with(sink_layer(&format, stdout).with_filter(stdout_filter))
            .with(sink_layer(&format, stderr).with_filter(LevelFilter::ERROR));

        Ok(Self {
            inner: Arc::new(LoggerInner {
                app_name: config.app_name.clone(),
                output_directory: config.output_directory.clone(),
                log_path,
                error_log_path,
                dispatch: Dispatch::new(subscriber),
            }),
        })
    }

    /// Make this logger the process-wide `tracing` default
    ///
    /// Fails with [`LoggerError::AlreadyInitialized`] if any global default
    /// was set before.
    pub fn install_global(&self) -> Result<()> {
        tracing::dispatcher::set_global_default(self.inner.dispatch.clone())
            .map_err(|_| LoggerError::AlreadyInitialized)
    }

    /// The dispatcher behind this logger, for scoping third-party `tracing` output
    pub fn dispatch(&self) -> &Dispatch {
        &self.inner.dispatch
    }

    pub fn app_name(&self) -> &str {
        &self.inner.app_name
    }

    pub fn output_directory(&self) -> &Path {
        &self.inner.output_directory
    }

    pub fn log_path(&self) -> &Path {
        &self.inner.log_path
    }

    pub fn error_log_path(&self) -> &Path {
        &self.inner.error_log_path
    }

    pub fn debug(&self, tag: &str, text: &str) {
        self.log(Severity::Debug, tag, text);
    }

    pub fn info(&self, tag: &str, text: &str) {
        self.log(Severity::Info, tag, text);
    }

    pub fn warn(&self, tag: &str, text: &str) {
        self.log(Severity::Warning, tag, text);
    }

    /// Log at error severity, appending `\nError:<error>`
    pub fn error(&self, tag: &str, text: &str, error: Option<&dyn fmt::Display>) {
        let error = match error {
            Some(error) => error.to_string(),
            None => NO_ERROR.to_string(),
        };
        self.emit(
            Severity::Error,
            &format!("{}\nError:{}", tagged(tag, text), error),
        );
    }

    /// Log a tagged message at any severity
    pub fn log(&self, severity: Severity, tag: &str, text: &str) {
        self.emit(severity, &tagged(tag, text));
    }

    /// A writable stream that logs every line written to it at `severity`
    pub fn stream(&self, severity: Severity) -> StreamAdapter {
        StreamAdapter::new(self.clone(), severity)
    }

    /// Emit an already composed message
    pub(crate) fn emit(&self, severity: Severity, message: &str) {
        tracing::dispatcher::with_default(&self.inner.dispatch, || match severity {
            Severity::Debug => tracing::debug!(target: TARGET, "{}", message),
            Severity::Info => tracing::info!(target: TARGET, "{}", message),
            Severity::Warning => tracing::warn!(target: TARGET, "{}", message),
            Severity::Error => tracing::error!(target: TARGET, "{}", message),
        });
    }
}

fn tagged(tag: &str, text: &str) -> String {
    format!("[{}]\t{}", tag, text)
}

fn open_sink(path: &Path, max_bytes: u64, backup_count: usize) -> Result<RotatingFile> {
    RotatingFile::open(path, max_bytes, backup_count).map_err(|source| LoggerError::OpenSink {
        path: path.to_path_buf(),
        source,
    })
}

fn sink_layer<S, K>(
    format: &RecordFormat,
    sink: K,
) -> tracing_subscriber::fmt::Layer<S, DefaultFields, RecordFormat, SinkWriter<K>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    K: RecordSink,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(format.clone())
        .with_writer(SinkWriter::new(Arc::new(sink)))
}
