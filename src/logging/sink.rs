//! Record sinks and their tracing-subscriber writer glue
//!
//! The fmt layer renders an event into a buffer and hands it to a writer. Our
//! writer collects those bytes and passes the complete record to the sink in
//! one call when it is dropped, so a sink always sees whole records and can
//! serialize them under its own lock.

use std::io::{self, Write};
use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;

/// A destination that accepts fully formatted records
pub trait RecordSink: Send + Sync + 'static {
    /// Append one complete record (including its trailing newline)
    fn append(&self, record: &[u8]) -> io::Result<()>;
}

/// Writer factory for tracing-subscriber
pub struct SinkWriter<S> {
    sink: Arc<S>,
}

impl<S: RecordSink> SinkWriter<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self { sink }
    }
}

impl<S> Clone for SinkWriter<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<'a, S: RecordSink> MakeWriter<'a> for SinkWriter<S> {
    type Writer = RecordWriter<S>;

    fn make_writer(&'a self) -> Self::Writer {
        RecordWriter {
            sink: Arc::clone(&self.sink),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Collects one record and commits it to the sink on drop
pub struct RecordWriter<S: RecordSink> {
    sink: Arc<S>,
    buf: Vec<u8>,
}

impl<S: RecordSink> Write for RecordWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: RecordSink> Drop for RecordWriter<S> {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        // Sink failures must never reach the caller of a logging method.
        let _ = self.sink.append(&self.buf);
    }
}
