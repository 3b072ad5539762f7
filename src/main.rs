use std::io::Write;

use anyhow::{Context, Result};

use tagged_logger::{init, LoggerConfig};

const TAG: &str = "Demo";

fn main() -> Result<()> {
    let logs_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join("tagged-logger")
        .join("logs");

    // Initialize logging BEFORE anything writes to stdout/stderr
    let (logger, guard) = init(LoggerConfig::new("tagged-logger-demo", &logs_dir))
        .context("Failed to initialize logging")?;

    logger.info(TAG, &format!("Logging to: {}", logger.log_path().display()));
    logger.debug(TAG, "Debug records go to log.txt and stdout");
    logger.warn(TAG, "Warnings go to log.txt and stdout");

    let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "ConnectionRefused");
    logger.error(TAG, "Errors go to log.txt, errors.txt and stderr", Some(&err));

    println!("Plain stdout output is captured at info");
    eprintln!("Plain stderr output is captured at error");
    std::io::stdout().flush().ok();

    // Third-party tracing output lands in the same sinks
    tracing::info!("Captured: {}", guard.is_capturing());

    drop(guard);
    Ok(())
}
