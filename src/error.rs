//! Error types for logger construction

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or installing a logger
///
/// Nothing here is raised after construction: sink write failures are
/// swallowed so logging never aborts the host.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// The output directory could not be created
    #[error("Failed to create log directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file sink could not be opened
    #[error("Failed to open log file {}: {source}", path.display())]
    OpenSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A process-wide logger was already installed
    #[error("Logger already initialized for this process")]
    AlreadyInitialized,

    /// Standard stream redirection failed
    #[error("Failed to capture {stream}: {source}")]
    Capture {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Standard stream redirection is not available on this platform
    #[error("Standard stream capture is not supported on this platform")]
    CaptureUnsupported,
}

pub type Result<T> = std::result::Result<T, LoggerError>;
