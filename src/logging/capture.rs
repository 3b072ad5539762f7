//! Capture of the process's standard output and error
//!
//! Descriptors 1 and 2 are pointed at pipes; a reader thread per pipe
//! reassembles lines from what it reads and logs each one through a
//! [`StreamAdapter`]. Everything that writes to those descriptors is captured
//! this way, including child processes that inherit them and the panic hook.
//!
//! Console sinks must not write to the captured descriptors, or every record
//! would loop back into the logger. [`redirect_stdio`] therefore builds the
//! logger itself, with consoles bound to duplicates of the original
//! descriptors taken before redirection.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::thread::{self, JoinHandle};

use super::console::ConsoleSink;
use super::level::Severity;
use super::logger::Logger;
use super::stream::StreamAdapter;
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};

/// A single read consisting of exactly this is dropped, like a `"^"` write.
const SUPPRESSED_READS: [&[u8]; 2] = [b"^", b"^\n"];

/// Duplicates of the standard descriptors taken before capture
struct OriginalStreams {
    stdout: OwnedFd,
    stderr: OwnedFd,
}

impl OriginalStreams {
    fn save() -> Result<Self> {
        let stdout = io::stdout()
            .as_fd()
            .try_clone_to_owned()
            .map_err(|source| capture_error("stdout", source))?;
        let stderr = io::stderr()
            .as_fd()
            .try_clone_to_owned()
            .map_err(|source| capture_error("stderr", source))?;
        Ok(Self { stdout, stderr })
    }

    /// Console sinks bound to the original terminal streams
    fn console_sinks(&self) -> Result<(ConsoleSink, ConsoleSink)> {
        let stdout = self
            .stdout
            .try_clone()
            .map_err(|source| capture_error("stdout", source))?;
        let stderr = self
            .stderr
            .try_clone()
            .map_err(|source| capture_error("stderr", source))?;
        Ok((
            ConsoleSink::new(File::from(stdout)),
            ConsoleSink::new(File::from(stderr)),
        ))
    }
}

/// Active capture of stdout and stderr
///
/// Dropping it (or calling [`StdioCapture::restore`]) points the descriptors
/// back at the originals and waits for the reader threads to drain. A child
/// process still holding a captured descriptor delays that wait until it
/// exits.
#[derive(Debug)]
pub struct StdioCapture {
    streams: Vec<CapturedStream>,
}

#[derive(Debug)]
struct CapturedStream {
    name: &'static str,
    fd: RawFd,
    original: OwnedFd,
    reader: Option<JoinHandle<()>>,
}

/// Build a logger from `config` and redirect stdout (logged at info) and
/// stderr (logged at error) into it
///
/// The logger's console sinks write to the streams as they were before the
/// redirection.
pub fn redirect_stdio(config: &LoggerConfig) -> Result<(Logger, StdioCapture)> {
    let originals = OriginalStreams::save()?;
    let (stdout, stderr) = originals.console_sinks()?;
    let logger = Logger::with_consoles(config, stdout, stderr)?;

    let mut capture = StdioCapture {
        streams: Vec::with_capacity(2),
    };
    capture.streams.push(redirect(
        "stdout",
        libc::STDOUT_FILENO,
        originals.stdout,
        logger.stream(Severity::Info),
    )?);
    // On failure `capture` drops here and restores stdout.
    capture.streams.push(redirect(
        "stderr",
        libc::STDERR_FILENO,
        originals.stderr,
        logger.stream(Severity::Error),
    )?);

    Ok((logger, capture))
}

impl StdioCapture {
    /// Stop capturing and flush everything already written into the logger
    pub fn restore(mut self) {
        self.restore_all();
    }

    fn restore_all(&mut self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();

        for stream in &mut self.streams {
            // Closes the pipe's last write end, so the reader sees EOF.
            if let Err(e) = restore_descriptor(&stream.original, stream.fd) {
                // The write end is still open; joining would block forever.
                tracing::warn!("Failed to restore {}: {}", stream.name, e);
                stream.reader = None;
                continue;
            }
            if let Some(reader) = stream.reader.take() {
                if reader.join().is_err() {
                    tracing::warn!("Capture reader for {} panicked", stream.name);
                }
            }
        }
        self.streams.clear();
    }
}

impl Drop for StdioCapture {
    fn drop(&mut self) {
        self.restore_all();
    }
}

fn redirect(
    name: &'static str,
    fd: RawFd,
    original: OwnedFd,
    adapter: StreamAdapter,
) -> Result<CapturedStream> {
    let (read_end, write_end) = cloexec_pipe().map_err(|source| capture_error(name, source))?;

    if fd == libc::STDOUT_FILENO {
        let _ = io::stdout().flush();
    } else {
        let _ = io::stderr().flush();
    }

    if unsafe { libc::dup2(write_end.as_raw_fd(), fd) } == -1 {
        return Err(capture_error(name, io::Error::last_os_error()));
    }
    drop(write_end);

    let spawned = thread::Builder::new()
        .name(format!("capture-{}", name))
        .spawn(move || pump(File::from(read_end), adapter));

    match spawned {
        Ok(reader) => Ok(CapturedStream {
            name,
            fd,
            original,
            reader: Some(reader),
        }),
        Err(source) => {
            if let Err(e) = restore_descriptor(&original, fd) {
                tracing::warn!("Failed to restore {}: {}", name, e);
            }
            Err(capture_error(name, source))
        }
    }
}

/// Point `target` back at `original`
fn restore_descriptor(original: &OwnedFd, target: RawFd) -> io::Result<()> {
    if unsafe { libc::dup2(original.as_raw_fd(), target) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Pipe whose ends are not inherited by child processes
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds: [libc::c_int; 2] = [0; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } == -1 {
        return Err(io::Error::last_os_error());
    }
    let (read_end, write_end) =
        unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

    for fd in [read_end.as_raw_fd(), write_end.as_raw_fd()] {
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFD);
            if flags != -1 {
                libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC);
            }
        }
    }
    Ok((read_end, write_end))
}

/// Reassembles lines from raw pipe reads
///
/// The sentinel applies to a whole read, never to a line inside one.
#[derive(Default)]
struct LineAssembler {
    pending: Vec<u8>,
}

impl LineAssembler {
    /// Log every line completed by `chunk`
    fn feed(&mut self, chunk: &[u8], adapter: &StreamAdapter) {
        if self.pending.is_empty() && SUPPRESSED_READS.contains(&chunk) {
            return;
        }
        self.pending.extend_from_slice(chunk);

        let Some(end) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return;
        };
        let complete: Vec<u8> = self.pending.drain(..=end).collect();
        for line in complete.split(|&b| b == b'\n') {
            adapter.write_line(&String::from_utf8_lossy(line));
        }
    }

    /// Log a trailing line that never got its terminator
    fn finish(&mut self, adapter: &StreamAdapter) {
        if !self.pending.is_empty() {
            adapter.write_line(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
    }
}

/// Forward lines from `source` until every write end is closed
fn pump(mut source: File, adapter: StreamAdapter) {
    let mut assembler = LineAssembler::default();
    let mut buf = [0u8; 8192];

    loop {
        match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => assembler.feed(&buf[..n], &adapter),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    assembler.finish(&adapter);
}

fn capture_error(stream: &'static str, source: io::Error) -> LoggerError {
    LoggerError::Capture { stream, source }
}
