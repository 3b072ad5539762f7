//! Logging pipeline
//!
//! Provides the tagged [`Logger`] with its rotating file and console sinks,
//! the [`StreamAdapter`] that turns written text into records, and optional
//! capture of the process's standard streams.

#[cfg(unix)]
pub mod capture;
mod console;
mod format;
mod init;
mod level;
mod logger;
mod rotating;
mod sink;
mod stream;

pub use console::ConsoleSink;
pub use format::{RecordFormat, TIMESTAMP_FORMAT};
pub use init::{init, LoggingGuard};
pub use level::Severity;
pub use logger::{Logger, TARGET};
pub use rotating::RotatingFile;
pub use sink::{RecordSink, SinkWriter};
pub use stream::StreamAdapter;

/// Primary log file, debug and above
pub const LOG_FILE_NAME: &str = "log.txt";

/// Error-only log file
pub const ERROR_FILE_NAME: &str = "errors.txt";
