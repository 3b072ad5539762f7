//! Logger configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::logging::Severity;

/// One mebibyte, the default rotation threshold
pub const MEGABYTE: u64 = 1024 * 1024;

/// Everything a [`Logger`](crate::Logger) is built from
///
/// This is the whole configuration surface: the library itself reads no
/// environment variables or files. The struct derives serde so host
/// applications can embed it in their own config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Name included verbatim in every record
    pub app_name: String,

    /// Directory holding `log.txt` and `errors.txt` (created if absent)
    pub output_directory: PathBuf,

    /// Minimum severity shown on the stdout console sink
    #[serde(default)]
    pub console_level: Severity,

    /// Size in bytes at which file sinks roll over
    #[serde(default = "default_file_max_bytes")]
    pub file_max_bytes: u64,

    /// Rotated `log.txt` backups to retain
    #[serde(default = "default_file_backup_count")]
    pub file_backup_count: usize,

    /// Rotated `errors.txt` backups to retain
    #[serde(default = "default_error_backup_count")]
    pub error_backup_count: usize,

    /// Whether global init redirects stdout/stderr into the logger
    #[serde(default = "default_capture_stdio")]
    pub capture_stdio: bool,
}

fn default_file_max_bytes() -> u64 {
    MEGABYTE
}

fn default_file_backup_count() -> usize {
    10
}

fn default_error_backup_count() -> usize {
    2
}

fn default_capture_stdio() -> bool {
    true
}

impl LoggerConfig {
    /// Create a config with default sink settings
    pub fn new(app_name: impl Into<String>, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            output_directory: output_directory.into(),
            console_level: Severity::default(),
            file_max_bytes: default_file_max_bytes(),
            file_backup_count: default_file_backup_count(),
            error_backup_count: default_error_backup_count(),
            capture_stdio: default_capture_stdio(),
        }
    }

    pub fn console_level(mut self, level: Severity) -> Self {
        self.console_level = level;
        self
    }

    pub fn file_max_bytes(mut self, max_bytes: u64) -> Self {
        self.file_max_bytes = max_bytes;
        self
    }

    pub fn file_backup_count(mut self, count: usize) -> Self {
        self.file_backup_count = count;
        self
    }

    pub fn error_backup_count(mut self, count: usize) -> Self {
        self.error_backup_count = count;
        self
    }

    pub fn capture_stdio(mut self, capture: bool) -> Self {
        self.capture_stdio = capture;
        self
    }

    /// Path of the primary log file
    pub fn log_path(&self) -> PathBuf {
        self.output_directory.join(crate::logging::LOG_FILE_NAME)
    }

    /// Path of the error-only log file
    pub fn error_log_path(&self) -> PathBuf {
        self.output_directory.join(crate::logging::ERROR_FILE_NAME)
    }
}
