//! Writable stream adapter onto a [`Logger`]
//!
//! Each `write` call is handled on its own: the buffer is trimmed of trailing
//! whitespace, split into lines, and every non-blank line becomes one record.
//! Partial lines are never carried over to the next call.

use std::io::{self, Write};

use super::level::Severity;
use super::logger::Logger;

/// A buffer consisting of exactly this text is dropped.
const SUPPRESS_SENTINEL: &str = "^";

/// Forwards text written to it into a logger at a fixed severity
#[derive(Debug, Clone)]
pub struct StreamAdapter {
    logger: Logger,
    severity: Severity,
}

impl StreamAdapter {
    pub fn new(logger: Logger, severity: Severity) -> Self {
        Self { logger, severity }
    }

    /// Adapter emitting at informational severity
    pub fn info(logger: Logger) -> Self {
        Self::new(logger, Severity::Info)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Log every non-blank line of `text`
    pub fn write_str(&self, text: &str) {
        if text == SUPPRESS_SENTINEL {
            return;
        }
        for line in text.trim_end().split(|c| c == '\n' || c == '\r') {
            self.write_line(line);
        }
    }

    /// Log one line as-is, skipping it if blank
    pub(crate) fn write_line(&self, line: &str) {
        let line = line.trim_end();
        if !line.is_empty() {
            self.logger.emit(self.severity, line);
        }
    }
}

impl Write for StreamAdapter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_str(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerConfig;
    use crate::logging::console::{ConsoleSink, SharedBuffer};
    use std::fs;
    use tempfile::TempDir;

    fn adapter(severity: Severity) -> (StreamAdapter, SharedBuffer, SharedBuffer, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let stdout = SharedBuffer::default();
        let stderr = SharedBuffer::default();
        let logger = Logger::with_consoles(
            &LoggerConfig::new("svc", temp_dir.path()),
            ConsoleSink::new(stdout.clone()),
            ConsoleSink::new(stderr.clone()),
        )
        .unwrap();
        (StreamAdapter::new(logger, severity), stdout, stderr, temp_dir)
    }

    fn messages(output: &str) -> Vec<String> {
        output
            .lines()
            .filter_map(|l| l.split_once("] ").map(|(_, rest)| rest.to_string()))
            .collect()
    }

    #[test]
    fn test_each_line_becomes_a_record() {
        let (mut stream, stdout, _stderr, _dir) = adapter(Severity::Info);

        stream.write_all(b"first line\nsecond line  \n\n   \nthird\n").unwrap();

        let output = stdout.contents();
        assert!(output.lines().all(|l| l.contains("[INFO] ")));
        assert_eq!(messages(&output), vec!["first line", "second line", "third"]);
    }

    #[test]
    fn test_sentinel_is_suppressed() {
        let (mut stream, stdout, _stderr, _dir) = adapter(Severity::Info);

        stream.write_all(b"^").unwrap();
        assert!(stdout.contents().is_empty());

        // Only the exact buffer is special
        stream.write_all(b"^\n").unwrap();
        stream.write_all(b"a^").unwrap();
        assert_eq!(messages(&stdout.contents()), vec!["^", "a^"]);
    }

    #[test]
    fn test_empty_and_blank_writes_are_noops() {
        let (mut stream, stdout, _stderr, dir) = adapter(Severity::Info);

        assert_eq!(stream.write(b"").unwrap(), 0);
        assert_eq!(stream.write(b" \n\t\n").unwrap(), 4);

        assert!(stdout.contents().is_empty());
        assert!(fs::read_to_string(dir.path().join("log.txt"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_no_buffering_across_writes() {
        let (mut stream, stdout, _stderr, _dir) = adapter(Severity::Info);

        stream.write_all(b"par").unwrap();
        stream.write_all(b"tial\n").unwrap();

        assert_eq!(messages(&stdout.contents()), vec!["par", "tial"]);
    }

    #[test]
    fn test_error_severity_goes_to_stderr() {
        let (mut stream, stdout, stderr, dir) = adapter(Severity::Error);

        stream
            .write_all(b"thread 'main' panicked at src/main.rs:1:1\n")
            .unwrap();

        assert!(stdout.contents().is_empty());
        assert!(stderr.contents().contains("[ERROR] thread 'main' panicked"));
        assert!(fs::read_to_string(dir.path().join("errors.txt"))
            .unwrap()
            .contains("[ERROR] thread 'main' panicked"));
    }

    #[test]
    fn test_carriage_returns_split_lines() {
        let (stream, stdout, _stderr, _dir) = adapter(Severity::Info);
        stream.write_str("dos line\r\nold mac\rend");
        assert_eq!(messages(&stdout.contents()), vec!["dos line", "old mac", "end"]);
    }

    #[test]
    fn test_flush_is_idempotent() {
        let (mut stream, stdout, _stderr, _dir) = adapter(Severity::Info);
        for _ in 0..5 {
            stream.flush().unwrap();
        }
        assert!(stdout.contents().is_empty());
    }

    #[test]
    fn test_info_constructor() {
        let (stream, _stdout, _stderr, _dir) = adapter(Severity::Error);
        let info = StreamAdapter::info(stream.logger.clone());
        assert_eq!(info.severity(), Severity::Info);
    }
}
