//! Test utilities for temporary log files and a notifier that records what
//! it was asked to send.

#[cfg(test)]
use crate::error::{Error, Result};
#[cfg(test)]
use crate::notifier::Notifier;
#[cfg(test)]
use std::cell::Cell;
#[cfg(test)]
use std::fs::{File, OpenOptions};
#[cfg(test)]
use std::io::Write;
#[cfg(test)]
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::time::{Duration, SystemTime};

#[cfg(test)]
pub struct TempLogFile {
    pub path: PathBuf,
    last_stamp: Cell<SystemTime>,
    _temp_dir: tempfile::TempDir,
}

#[cfg(test)]
impl TempLogFile {
    /// Create a new empty temporary log file
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("test.log");

        File::create(&path)?;

        Ok(Self {
            path,
            last_stamp: Cell::new(SystemTime::UNIX_EPOCH),
            _temp_dir: temp_dir,
        })
    }

    /// Create a temporary log file with one initial line
    pub fn with_content(content: &str) -> std::io::Result<Self> {
        let temp_file = Self::new()?;
        temp_file.append_content(content)?;
        Ok(temp_file)
    }

    /// Create a temporary log file holding exactly `bytes`
    pub fn with_bytes(bytes: &[u8]) -> std::io::Result<Self> {
        let temp_file = Self::new()?;
        temp_file.append_bytes(bytes)?;
        Ok(temp_file)
    }

    /// Append a line to the temporary log file
    pub fn append_content(&self, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;

        writeln!(file, "{}", content)?;
        file.flush()?;
        self.bump_modified(&file)
    }

    /// Append raw bytes without a line terminator
    pub fn append_bytes(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;

        file.write_all(bytes)?;
        file.flush()?;
        self.bump_modified(&file)
    }

    /// Replace the whole file (simulate log rotation)
    pub fn rewrite(&self, content: &str) -> std::io::Result<()> {
        let mut file = File::create(&self.path)?;

        file.write_all(content.as_bytes())?;
        file.flush()?;
        self.bump_modified(&file)
    }

    /// Get the path to the temporary file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filesystem timestamps can be coarser than the time between two writes
    /// in a test, so every write moves the modification time a full second
    /// past the previous one.
    fn bump_modified(&self, file: &File) -> std::io::Result<()> {
        let current = file.metadata()?.modified()?;
        let stamp = current.max(self.last_stamp.get()) + Duration::from_secs(1);
        file.set_modified(stamp)?;
        self.last_stamp.set(stamp);
        Ok(())
    }
}

/// One notification captured by [`RecordingNotifier`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub title: String,
    pub body: String,
    pub sticky: bool,
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub registered: bool,
    pub sent: Vec<Sent>,
    /// Bodies containing this text fail to send.
    pub fail_on: Option<String>,
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    async fn register(&mut self) -> Result<()> {
        self.registered = true;
        Ok(())
    }

    async fn notify(&mut self, title: &str, body: &str, sticky: bool) -> Result<()> {
        if self.fail_on.as_deref().is_some_and(|needle| body.contains(needle)) {
            return Err(Error::Notify {
                message: format!("refused: {}", body),
            });
        }

        self.sent.push(Sent {
            title: title.to_string(),
            body: body.to_string(),
            sticky,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_log_file_creation() {
        let temp_file = TempLogFile::new().unwrap();
        assert!(temp_file.path().exists());
    }

    #[tokio::test]
    async fn test_append_content() {
        let temp_file = TempLogFile::new().unwrap();
        temp_file.append_content("line 1").unwrap();
        temp_file.append_content("line 2").unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "line 1\nline 2\n");
    }

    #[tokio::test]
    async fn test_rewrite_replaces_content() {
        let temp_file = TempLogFile::with_content("initial content").unwrap();
        temp_file.rewrite("replaced").unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "replaced");
    }

    #[tokio::test]
    async fn test_every_write_moves_mtime_forward() {
        let temp_file = TempLogFile::with_content("a").unwrap();
        let first = std::fs::metadata(temp_file.path()).unwrap().modified().unwrap();

        temp_file.append_content("b").unwrap();
        let second = std::fs::metadata(temp_file.path()).unwrap().modified().unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_recording_notifier_failure() {
        let mut notifier = RecordingNotifier {
            fail_on: Some("boom".to_string()),
            ..Default::default()
        };

        assert!(notifier.notify("t", "fine", false).await.is_ok());
        assert!(notifier.notify("t", "boom", true).await.is_err());
        assert_eq!(notifier.sent.len(), 1);
    }
}
