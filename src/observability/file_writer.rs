//! Rotating log file with size-based rotation and backup retention.
//!
//! The terminal host owns stdout, so log lines go to a file instead. When the
//! file would grow past its size limit it is shifted to `<name>.1` (and
//! `<name>.1` to `<name>.2`, and so on); the oldest backup beyond the
//! retention limit is removed.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;

/// Maximum file size before rotation (10 MB).
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Number of backup files to retain after rotation.
pub const MAX_BACKUP_FILES: usize = 3;

#[derive(Debug, Default)]
struct OpenFile {
    file: Option<File>,
    /// Bytes in the current file.
    len: u64,
}

/// Thread-safe rotating file, usable as a `tracing-subscriber` writer.
///
/// The file is opened lazily on the first write, so construction never
/// fails.
#[derive(Debug)]
pub struct RotatingFile {
    file_path: PathBuf,
    max_bytes: u64,
    backups: usize,
    state: Mutex<OpenFile>,
}

impl RotatingFile {
    #[must_use]
    pub fn new(file_path: PathBuf) -> Self {
        Self::with_limits(file_path, MAX_FILE_SIZE_BYTES, MAX_BACKUP_FILES)
    }

    /// Creates a writer with explicit limits.
    ///
    /// # Parameters
    ///
    /// * `file_path` - Path of the live log file
    /// * `max_bytes` - Size after which the file is rotated
    /// * `backups` - Number of rotated files to keep
    #[must_use]
    pub fn with_limits(file_path: PathBuf, max_bytes: u64, backups: usize) -> Self {
        Self {
            file_path,
            max_bytes,
            backups,
            state: Mutex::new(OpenFile::default()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.file_path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// Shifts backups up by one and moves the live file to `.1`.
    fn rotate(&self, state: &mut OpenFile) -> io::Result<()> {
        state.file = None;
        state.len = 0;

        if self.backups == 0 {
            if self.file_path.exists() {
                fs::remove_file(&self.file_path)?;
            }
            return Ok(());
        }

        let oldest = self.backup_path(self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        if self.file_path.exists() {
            fs::rename(&self.file_path, self.backup_path(1))?;
        }
        Ok(())
    }

    fn write_locked(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| io::Error::other(format!("log file mutex poisoned: {e}")))?;

        if state.file.is_none() {
            state.len = fs::metadata(&self.file_path).map_or(0, |m| m.len());
        }
        let incoming = buf.len() as u64;
        if state.len > 0 && state.len + incoming > self.max_bytes {
            self.rotate(&mut state)?;
        }

        if state.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.file_path)?;
            state.file = Some(file);
        }
        let file = state
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file unavailable"))?;

        file.write_all(buf)?;
        state.len += incoming;
        Ok(buf.len())
    }
}

impl Write for &RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_locked(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| io::Error::other(format!("log file mutex poisoned: {e}")))?;
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = &'a RotatingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_and_keeps_limited_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netmodal.log");
        let log = RotatingFile::with_limits(path.clone(), 10, 2);

        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            (&log).write_all(line.as_bytes()).unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "dddddddd\n");
        assert_eq!(fs::read_to_string(log.backup_path(1)).unwrap(), "cccccccc\n");
        assert_eq!(fs::read_to_string(log.backup_path(2)).unwrap(), "bbbbbbbb\n");
        assert!(!log.backup_path(3).exists());
    }

    #[test]
    fn small_writes_share_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netmodal.log");
        let log = RotatingFile::with_limits(path.clone(), 100, 3);

        (&log).write_all(b"one\n").unwrap();
        (&log).write_all(b"two\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
        assert!(!log.backup_path(1).exists());
    }
}
