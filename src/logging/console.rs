//! Console sinks
//!
//! A console sink owns its output stream. By default that is the process's
//! stdout/stderr; when the standard streams are captured, the sinks are bound
//! to duplicates of the original descriptors instead so their output does not
//! loop back into the logger.

use std::io::{self, Write};
use std::sync::Mutex;

use super::sink::RecordSink;

/// A sink writing records to a terminal-like stream
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl RecordSink for ConsoleSink {
    fn append(&self, record: &[u8]) -> io::Result<()> {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        out.write_all(record)?;
        out.flush()
    }
}

/// In-memory console for tests
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_sink_writes_records() {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::new(buffer.clone());

        sink.append(b"one\n").unwrap();
        sink.append(b"two\n").unwrap();

        assert_eq!(buffer.contents(), "one\ntwo\n");
    }
}
