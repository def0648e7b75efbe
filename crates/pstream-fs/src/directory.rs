//! Directory iteration session with rewind.

use pstream_core::error::{Result, StreamError};
use std::path::{Path, PathBuf};

/// Cursor over a snapshot of a directory listing.
///
/// Entries are `.`, `..`, then the directory's names in byte order, captured
/// when the session is opened. `rewind` resets the cursor, so the first
/// entry is the same on every pass. After `close` every call fails with
/// [`StreamError::SessionClosed`].
#[derive(Debug)]
pub struct DirectorySession {
    path: PathBuf,
    entries: Vec<String>,
    cursor: usize,
    closed: bool,
}

impl DirectorySession {
    pub fn new(path: impl Into<PathBuf>, names: Vec<String>) -> Self {
        let mut names: Vec<String> = names
            .into_iter()
            .filter(|n| n != "." && n != "..")
            .collect();
        names.sort();

        let mut entries = Vec::with_capacity(names.len() + 2);
        entries.push(".".to_string());
        entries.push("..".to_string());
        entries.extend(names);

        Self {
            path: path.into(),
            entries,
            cursor: 0,
            closed: false,
        }
    }

    /// Resolved directory this session lists.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next entry, or `None` at the end of the listing.
    pub fn read_next(&mut self) -> Result<Option<String>> {
        self.ensure_open()?;
        let entry = self.entries.get(self.cursor).cloned();
        if entry.is_some() {
            self.cursor += 1;
        }
        Ok(entry)
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.cursor = 0;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        self.entries.clear();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of entries including `.` and `..`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries not yet returned by `read_next`.
    pub fn remaining(&mut self) -> Result<Vec<String>> {
        self.ensure_open()?;
        let rest = self.entries[self.cursor..].to_vec();
        self.cursor = self.entries.len();
        Ok(rest)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(StreamError::SessionClosed)
        } else {
            Ok(())
        }
    }
}
