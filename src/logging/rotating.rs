//! Size-rotated log files
//!
//! Before a record is appended, the file rolls over if the record would take
//! it to `max_bytes` or beyond: `<name>.<n-1>` becomes `<name>.<n>` and so on
//! down to `<name>` becoming `<name>.1`, and the oldest backup is deleted.
//! With `backup_count == 0` the file never rolls over. An empty file never
//! rolls over either, so an oversized record is written whole instead of
//! producing an empty backup.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::sink::RecordSink;

/// A log file that rotates by size
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    state: Mutex<FileState>,
}

struct FileState {
    /// `None` after a failed reopen; the next append retries.
    file: Option<File>,
    size: u64,
}

impl RotatingFile {
    /// Open (or create) `path` for appending
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            backup_count,
            state: Mutex::new(FileState {
                file: Some(file),
                size,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `index`-th backup (`1` is the most recent)
    pub fn backup_path(&self, index: usize) -> PathBuf {
        backup_path(&self.path, index)
    }

    fn should_rollover(&self, size: u64, incoming: usize) -> bool {
        self.backup_count > 0
            && self.max_bytes > 0
            && size > 0
            && size + incoming as u64 >= self.max_bytes
    }

    fn rollover(&self, state: &mut FileState) -> io::Result<()> {
        // Close before renaming; required on Windows.
        state.file = None;

        let oldest = self.backup_path(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backup_count).rev() {
            let src = self.backup_path(index);
            if src.exists() {
                fs::rename(&src, self.backup_path(index + 1))?;
            }
        }
        if self.path.exists() {
            fs::rename(&self.path, self.backup_path(1))?;
        }

        state.file = Some(open_append(&self.path)?);
        state.size = 0;
        Ok(())
    }
}

impl RecordSink for RotatingFile {
    fn append(&self, record: &[u8]) -> io::Result<()> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        if self.should_rollover(state.size, record.len()) {
            self.rollover(&mut state)?;
        }

        if state.file.is_none() {
            let file = open_append(&self.path)?;
            state.size = file.metadata()?.len();
            state.file = Some(file);
        }

        if let Some(file) = state.file.as_mut() {
            file.write_all(record)?;
            file.flush()?;
            state.size += record.len() as u64;
        }
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(n: usize) -> Vec<u8> {
        // 10 bytes per record
        format!("record {:02}\n", n).into_bytes()
    }

    #[test]
    fn test_append_writes_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = RotatingFile::open(temp_dir.path().join("log.txt"), 1024, 2).unwrap();

        file.append(b"first\n").unwrap();
        file.append(b"second\n").unwrap();

        let contents = fs::read_to_string(file.path()).unwrap();
        assert_eq!(contents, "first\nsecond\n");
        assert!(!file.backup_path(1).exists());
    }

    #[test]
    fn test_open_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.txt");
        fs::write(&path, "earlier\n").unwrap();

        let file = RotatingFile::open(&path, 1024, 2).unwrap();
        file.append(b"later\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }

    #[test]
    fn test_rollover_creates_backup_and_fresh_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = RotatingFile::open(temp_dir.path().join("log.txt"), 25, 3).unwrap();

        file.append(&record(1)).unwrap();
        file.append(&record(2)).unwrap();
        // 20 + 10 >= 25, so this one lands in a fresh file
        file.append(&record(3)).unwrap();

        assert_eq!(
            fs::read_to_string(file.backup_path(1)).unwrap(),
            "record 01\nrecord 02\n"
        );
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "record 03\n");
    }

    #[test]
    fn test_backup_count_is_never_exceeded() {
        let temp_dir = TempDir::new().unwrap();
        let file = RotatingFile::open(temp_dir.path().join("log.txt"), 10, 2).unwrap();

        for n in 0..6 {
            file.append(&record(n)).unwrap();
        }

        // One record per file; newest in the primary, then .1, then .2
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "record 05\n");
        assert_eq!(fs::read_to_string(file.backup_path(1)).unwrap(), "record 04\n");
        assert_eq!(fs::read_to_string(file.backup_path(2)).unwrap(), "record 03\n");
        assert!(!file.backup_path(3).exists());

        let entries = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 3);
    }

    #[test]
    fn test_zero_backups_never_rolls_over() {
        let temp_dir = TempDir::new().unwrap();
        let file = RotatingFile::open(temp_dir.path().join("log.txt"), 10, 0).unwrap();

        for n in 0..3 {
            file.append(&record(n)).unwrap();
        }

        assert_eq!(fs::read_to_string(file.path()).unwrap().lines().count(), 3);
        assert!(!file.backup_path(1).exists());
    }

    #[test]
    fn test_oversized_record_does_not_rotate_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = RotatingFile::open(temp_dir.path().join("log.txt"), 4, 2).unwrap();

        file.append(b"much longer than four bytes\n").unwrap();

        assert!(!file.backup_path(1).exists());
        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            "much longer than four bytes\n"
        );
    }

    #[test]
    fn test_backup_path_appends_index() {
        let path = Path::new("/var/log/svc/errors.txt");
        assert_eq!(
            backup_path(path, 2),
            PathBuf::from("/var/log/svc/errors.txt.2")
        );
    }

    #[test]
    fn test_concurrent_appends_keep_records_whole() {
        let temp_dir = TempDir::new().unwrap();
        let file = std::sync::Arc::new(
            RotatingFile::open(temp_dir.path().join("log.txt"), 1 << 20, 1).unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let file = std::sync::Arc::clone(&file);
                std::thread::spawn(move || {
                    for n in 0..50 {
                        file.append(format!("thread {} line {}\n", t, n).as_bytes())
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = fs::read_to_string(file.path()).unwrap();
        assert_eq!(contents.lines().count(), 200);
        assert!(contents.lines().all(|l| l.starts_with("thread ")));
    }
}
