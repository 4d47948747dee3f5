//! Per-file tail state: encoding, change detection and the cursor.

use crate::cursor::{CursorMode, TailCursor};
use crate::encoding::{self, TextEncoding};
use crate::error::Result;
use chrono::{Local, NaiveDateTime};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, warn};

/// A log file being tailed.
///
/// The encoding is detected once when the file is opened; a file whose
/// encoding cannot be determined stays in the set but never yields lines.
#[derive(Debug)]
pub struct WatchedFile {
    path: PathBuf,
    encoding: Option<TextEncoding>,
    last_write_time: Option<SystemTime>,
    last_length: u64,
    cursor: TailCursor,
    primed: bool,
}

impl WatchedFile {
    /// Opens `path`, reads it once to detect its encoding and records its
    /// current metadata.
    pub async fn open<P: AsRef<Path>>(path: P, mode: CursorMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = fs::metadata(&path).await?;
        let bytes = fs::read(&path).await?;

        let encoding = encoding::detect(&bytes);
        match encoding {
            Some(encoding) => debug!(path = %path.display(), %encoding, "Detected encoding"),
            None => warn!(
                path = %path.display(),
                "Could not determine the text encoding; the file will not be tailed"
            ),
        }

        Ok(Self {
            path,
            encoding,
            last_write_time: metadata.modified().ok(),
            last_length: metadata.len(),
            cursor: TailCursor::new(mode),
            primed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The detected encoding, `None` when the file is not text.
    pub fn encoding(&self) -> Option<TextEncoding> {
        self.encoding
    }

    pub fn cursor(&self) -> &TailCursor {
        &self.cursor
    }

    /// Whether the baseline read has happened.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Returns the lines appended since the previous poll.
    ///
    /// The first successful read only establishes the cursor baseline and
    /// returns nothing. Read failures are logged and yield nothing; the file
    /// is retried on the next poll.
    pub async fn poll_new_lines(&mut self) -> Vec<String> {
        self.poll_new_lines_at(Local::now().naive_local()).await
    }

    /// [`poll_new_lines`](Self::poll_new_lines) against an explicit clock,
    /// which the timestamp cursor uses for its staleness horizon.
    pub async fn poll_new_lines_at(&mut self, now: NaiveDateTime) -> Vec<String> {
        let Some(encoding) = self.encoding else {
            return Vec::new();
        };

        let lines = match self.read_if_changed(encoding).await {
            Ok(Some(lines)) => lines,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Can't read log file");
                return Vec::new();
            }
        };

        let fresh = self.cursor.advance(lines, now);
        if !self.primed {
            self.primed = true;
            debug!(path = %self.path.display(), cursor = ?self.cursor, "Primed cursor");
            return Vec::new();
        }

        fresh
    }

    /// Reads and splits the whole file when its modification time moved
    /// forward. Metadata is only committed after the read succeeded.
    async fn read_if_changed(&mut self, encoding: TextEncoding) -> Result<Option<Vec<String>>> {
        let metadata = match fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Log file is missing");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let modified = metadata.modified().ok();
        let length = metadata.len();
        if self.primed
            && !has_been_updated(modified, self.last_write_time, length, self.last_length)
        {
            return Ok(None);
        }

        // tokio opens files with the platform's shared read/write access, so
        // the writer is never locked out.
        let bytes = fs::read(&self.path).await?;

        if length < self.last_length {
            debug!(
                path = %self.path.display(),
                length,
                previous = self.last_length,
                "Log file shrank"
            );
        }
        self.last_write_time = modified;
        self.last_length = length;

        Ok(Some(split_lines(&encoding.decode(&bytes))))
    }
}

/// A file counts as updated when its modification time is strictly newer.
/// Without modification times, a size change is used instead.
fn has_been_updated(
    modified: Option<SystemTime>,
    last_modified: Option<SystemTime>,
    length: u64,
    last_length: u64,
) -> bool {
    match (modified, last_modified) {
        (Some(current), Some(last)) => current > last,
        (Some(_), None) => true,
        (None, _) => length != last_length,
    }
}

/// Splits on `\n`, `\r\n` and `\r`. A trailing terminator does not produce an
/// empty last line.
fn split_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = content;

    while !rest.is_empty() {
        match rest.find(&['\r', '\n'][..]) {
            Some(end) => {
                lines.push(rest[..end].to_string());
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + terminator..];
            }
            None => {
                lines.push(rest.to_string());
                break;
            }
        }
    }

    lines
}
