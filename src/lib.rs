//! tagged-logger - tagged logging with rotating files and stdio capture
//!
//! Configures a logger with four sinks (rotating `log.txt`, rotating
//! `errors.txt`, console stdout, console stderr) sharing one record layout,
//! and can redirect the process's stdout/stderr into it.
//!
//! ```no_run
//! use tagged_logger::{init, LoggerConfig};
//!
//! let (logger, _guard) = init(LoggerConfig::new("svc", "/var/log/svc"))?;
//! logger.info("Main", "Starting up");
//! println!("captured as an info record");
//! # Ok::<(), tagged_logger::LoggerError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{LoggerConfig, MEGABYTE};
pub use error::LoggerError;
pub use logging::{init, Logger, LoggingGuard, Severity, StreamAdapter};
