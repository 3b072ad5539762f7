//! Redirection of the process's stdout/stderr into the logger.
//!
//! Writes go through `std::io::stdout()` directly: the test harness only
//! intercepts the `print!` family, not the underlying descriptors.

#![cfg(unix)]

use std::fs;
use std::io::Write;

use tagged_logger::{init, LoggerConfig};
use tempfile::TempDir;

fn messages(log: &str) -> Vec<&str> {
    log.lines()
        .filter_map(|l| l.split_once("] ").map(|(_, rest)| rest))
        .collect()
}

#[test]
fn test_standard_streams_are_logged() {
    let temp_dir = TempDir::new().unwrap();
    let config = LoggerConfig::new("svc", temp_dir.path());

    let (logger, guard) = init(config).unwrap();
    assert!(guard.is_capturing());

    {
        let mut stdout = std::io::stdout();
        stdout.write_all(b"line one\n\nline two   \n").unwrap();
        stdout.flush().unwrap();
        // A "^" line inside a larger write is ordinary output
        stdout.write_all(b"a\n^\nb\n").unwrap();
        stdout.flush().unwrap();
    }
    std::io::stderr().write_all(b"something broke\n").unwrap();

    // Restores the descriptors and drains the reader threads
    drop(guard);

    let log = fs::read_to_string(logger.log_path()).unwrap();
    assert!(log.contains("[INFO] line one\n"), "{:?}", log);
    assert!(log.contains("[INFO] line two\n"));
    assert!(log.contains("[INFO] ^\n"));
    assert!(log.contains("[ERROR] something broke\n"));
    assert_eq!(log.lines().count(), 6);

    // Order within one stream is preserved
    let stdout_lines: Vec<&str> = messages(&log)
        .into_iter()
        .filter(|m| *m != "something broke")
        .collect();
    assert_eq!(stdout_lines, vec!["line one", "line two", "a", "^", "b"]);

    let errors = fs::read_to_string(logger.error_log_path()).unwrap();
    assert!(errors.contains("[ERROR] something broke\n"));
    assert!(!errors.contains("line one"));
}
