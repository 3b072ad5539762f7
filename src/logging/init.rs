//! Process-wide initialization
//!
//! Builds a [`Logger`], optionally captures stdout/stderr into it, and
//! installs it as the global `tracing` default. Only one initialization per
//! process succeeds.

use std::sync::atomic::{AtomicBool, Ordering};

use super::logger::Logger;
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};

#[cfg(unix)]
use super::capture::{self, StdioCapture};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Guard that keeps stream capture alive
///
/// Dropping it restores the original stdout/stderr and drains anything still
/// in flight into the logger. The global logger itself stays installed.
#[derive(Debug)]
pub struct LoggingGuard {
    #[cfg(unix)]
    capture: Option<StdioCapture>,
}

impl LoggingGuard {
    /// Whether stdout/stderr are currently redirected into the logger
    pub fn is_capturing(&self) -> bool {
        #[cfg(unix)]
        {
            self.capture.is_some()
        }
        #[cfg(not(unix))]
        {
            false
        }
    }
}

/// Initialize process-wide logging
///
/// Returns the logger and a guard that must be kept alive for the duration
/// of logging. A second call fails with [`LoggerError::AlreadyInitialized`].
pub fn init(config: LoggerConfig) -> Result<(Logger, LoggingGuard)> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(LoggerError::AlreadyInitialized);
    }

    let result = install(&config);
    if result.is_err() {
        INITIALIZED.store(false, Ordering::SeqCst);
    }
    result
}

#[cfg(unix)]
fn install(config: &LoggerConfig) -> Result<(Logger, LoggingGuard)> {
    let (logger, capture) = if config.capture_stdio {
        let (logger, capture) = capture::redirect_stdio(config)?;
        (logger, Some(capture))
    } else {
        (Logger::new(config)?, None)
    };

    // On failure `capture` drops and restores the standard streams.
    logger.install_global()?;

    Ok((logger, LoggingGuard { capture }))
}

#[cfg(not(unix))]
fn install(config: &LoggerConfig) -> Result<(Logger, LoggingGuard)> {
    if config.capture_stdio {
        return Err(LoggerError::CaptureUnsupported);
    }
    let logger = Logger::new(config)?;
    logger.install_global()?;
    Ok((logger, LoggingGuard {}))
}
