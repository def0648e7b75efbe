//! Real filesystem primitives the dispatcher delegates to.
//!
//! Every failure is translated into [`StreamError`] so callers can tell
//! not-found, already-exists and not-empty apart.

use async_trait::async_trait;
use pstream_core::error::{Result, StreamError};
use pstream_core::types::EntryKind;
use serde::Serialize;
use std::path::Path;
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// How a write treats an existing target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Create or overwrite.
    #[default]
    Truncate,
    /// Create or append to the end.
    Append,
    /// Create; fail with `AlreadyExists` if the target exists.
    CreateNew,
}

/// Attributes of an existing target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub kind: EntryKind,
    pub len: u64,
    pub modified: SystemTime,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    fn from_std(meta: &std::fs::Metadata) -> Self {
        let file_type = meta.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::File
        };
        Self {
            kind,
            len: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }
}

/// Filesystem collaborator. Paths handed in are already resolved and contained.
#[async_trait]
pub trait RealFs: Send + Sync {
    async fn metadata(&self, path: &Path) -> Result<Metadata>;

    async fn exists(&self, path: &Path) -> bool {
        self.metadata(path).await.is_ok()
    }

    /// Entry names of a directory, excluding `.` and `..`, in enumeration order.
    async fn read_dir(&self, path: &Path) -> Result<Vec<String>>;

    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Returns the number of bytes written.
    async fn write(&self, path: &Path, data: &[u8], mode: WriteMode) -> Result<usize>;

    async fn create_dir(&self, path: &Path, recursive: bool) -> Result<()>;

    /// Remove an empty directory.
    async fn remove_dir(&self, path: &Path) -> Result<()>;

    async fn remove_file(&self, path: &Path) -> Result<()>;

    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Create an empty file if absent, then set its modification time.
    async fn touch(&self, path: &Path, mtime: Option<SystemTime>) -> Result<()>;
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StreamError + '_ {
    move |e| StreamError::from_io(e, path.display().to_string())
}

/// [`RealFs`] over the local disk via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RealFs for LocalFs {
    async fn metadata(&self, path: &Path) -> Result<Metadata> {
        let meta = fs::symlink_metadata(path).await.map_err(io_err(path))?;
        Ok(Metadata::from_std(&meta))
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>> {
        let mut rd = fs::read_dir(path).await.map_err(io_err(path))?;
        let mut names = Vec::new();
        while let Some(entry) = rd.next_entry().await.map_err(io_err(path))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == "." || name == ".." {
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).await.map_err(io_err(path))
    }

    async fn write(&self, path: &Path, data: &[u8], mode: WriteMode) -> Result<usize> {
        let mut options = fs::OpenOptions::new();
        match mode {
            WriteMode::Truncate => options.write(true).create(true).truncate(true),
            WriteMode::Append => options.append(true).create(true),
            WriteMode::CreateNew => options.write(true).create_new(true),
        };
        let mut file = options.open(path).await.map_err(io_err(path))?;
        file.write_all(data).await.map_err(io_err(path))?;
        file.flush().await.map_err(io_err(path))?;
        Ok(data.len())
    }

    async fn create_dir(&self, path: &Path, recursive: bool) -> Result<()> {
        if recursive {
            // create_dir_all succeeds on an existing directory; mkdir must not.
            if fs::symlink_metadata(path).await.is_ok() {
                return Err(StreamError::AlreadyExists(path.display().to_string()));
            }
            fs::create_dir_all(path).await.map_err(io_err(path))
        } else {
            fs::create_dir(path).await.map_err(io_err(path))
        }
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        fs::remove_dir(path).await.map_err(io_err(path))
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        let meta = fs::symlink_metadata(path).await.map_err(io_err(path))?;
        if meta.is_dir() {
            return Err(StreamError::IsADirectory(path.display().to_string()));
        }
        fs::remove_file(path).await.map_err(io_err(path))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).await.map_err(io_err(from))
    }

    async fn touch(&self, path: &Path, mtime: Option<SystemTime>) -> Result<()> {
        // Existing targets, directories included, only get a new timestamp
        // and need no write access.
        let file = if fs::symlink_metadata(path).await.is_ok() {
            fs::File::open(path).await.map_err(io_err(path))?
        } else {
            fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .await
                .map_err(io_err(path))?
        };
        let file = file.into_std().await;
        let mtime = mtime.unwrap_or_else(SystemTime::now);
        tokio::task::spawn_blocking(move || file.set_modified(mtime))
            .await
            .map_err(|e| StreamError::Io {
                path: path.display().to_string(),
                source: std::io::Error::other(e),
            })?
            .map_err(io_err(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn make_fs() -> (TempDir, LocalFs) {
        (TempDir::new().unwrap(), LocalFs::new())
    }

    #[tokio::test]
    async fn test_write_read() {
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("a.txt");
        assert_eq!(lfs.write(&p, b"hello", WriteMode::Truncate).await.unwrap(), 5);
        assert_eq!(lfs.read(&p).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_write_truncates() {
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("a.txt");
        lfs.write(&p, b"longer text", WriteMode::Truncate).await.unwrap();
        lfs.write(&p, b"short", WriteMode::Truncate).await.unwrap();
        assert_eq!(lfs.read(&p).await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_write_append() {
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("log.txt");
        lfs.write(&p, b"hello", WriteMode::Append).await.unwrap();
        lfs.write(&p, b" world", WriteMode::Append).await.unwrap();
        assert_eq!(lfs.read(&p).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_write_create_new_existing() {
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("once.txt");
        lfs.write(&p, b"1", WriteMode::CreateNew).await.unwrap();
        let err = lfs.write(&p, b"2", WriteMode::CreateNew).await.unwrap_err();
        assert!(matches!(err, StreamError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_write_missing_parent() {
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("nope/a.txt");
        let err = lfs.write(&p, b"x", WriteMode::Truncate).await.unwrap_err();
        assert!(matches!(err, StreamError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let (tmp, lfs) = make_fs();
        let err = lfs.read(&tmp.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, StreamError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_dir_and_metadata() {
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("d");
        lfs.create_dir(&p, false).await.unwrap();
        let meta = lfs.metadata(&p).await.unwrap();
        assert!(meta.is_dir());
        assert!(lfs.exists(&p).await);
    }

    #[tokio::test]
    async fn test_create_dir_existing() {
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("d");
        lfs.create_dir(&p, false).await.unwrap();
        assert!(matches!(
            lfs.create_dir(&p, false).await,
            Err(StreamError::AlreadyExists(_))
        ));
        assert!(matches!(
            lfs.create_dir(&p, true).await,
            Err(StreamError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_create_dir_missing_parent() {
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("a/b/c");
        assert!(matches!(
            lfs.create_dir(&p, false).await,
            Err(StreamError::NotFound(_))
        ));
        lfs.create_dir(&p, true).await.unwrap();
        assert!(lfs.metadata(&p).await.unwrap().is_dir());
    }

    #[tokio::test]
    async fn test_remove_dir_not_empty() {
        let (tmp, lfs) = make_fs();
        let d = tmp.path().join("d");
        lfs.create_dir(&d, false).await.unwrap();
        lfs.write(&d.join("f"), b"x", WriteMode::Truncate).await.unwrap();
        assert!(matches!(lfs.remove_dir(&d).await, Err(StreamError::NotEmpty(_))));
        lfs.remove_file(&d.join("f")).await.unwrap();
        lfs.remove_dir(&d).await.unwrap();
        assert!(!lfs.exists(&d).await);
    }

    #[tokio::test]
    async fn test_remove_file_on_directory() {
        let (tmp, lfs) = make_fs();
        let d = tmp.path().join("d");
        lfs.create_dir(&d, false).await.unwrap();
        assert!(matches!(
            lfs.remove_file(&d).await,
            Err(StreamError::IsADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_read_dir_excludes_dots() {
        let (tmp, lfs) = make_fs();
        lfs.write(&tmp.path().join("a"), b"", WriteMode::Truncate).await.unwrap();
        lfs.create_dir(&tmp.path().join("b"), false).await.unwrap();
        let mut names = lfs.read_dir(tmp.path()).await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_read_dir_on_file() {
        let (tmp, lfs) = make_fs();
        let f = tmp.path().join("f");
        lfs.write(&f, b"x", WriteMode::Truncate).await.unwrap();
        assert!(matches!(
            lfs.read_dir(&f).await,
            Err(StreamError::NotADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_touch_creates_empty() {
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("t");
        lfs.touch(&p, None).await.unwrap();
        let meta = lfs.metadata(&p).await.unwrap();
        assert!(meta.is_file());
        assert_eq!(meta.len, 0);
    }

    #[tokio::test]
    async fn test_touch_keeps_contents_and_sets_mtime() {
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("t");
        lfs.write(&p, b"keep", WriteMode::Truncate).await.unwrap();
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
        lfs.touch(&p, Some(when)).await.unwrap();
        let meta = lfs.metadata(&p).await.unwrap();
        assert_eq!(meta.modified, when);
        assert_eq!(lfs.read(&p).await.unwrap(), b"keep");
    }

    #[tokio::test]
    async fn test_touch_directory_sets_mtime() {
        let (tmp, lfs) = make_fs();
        let d = tmp.path().join("dir");
        lfs.create_dir(&d, false).await.unwrap();
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_200_000_000);
        lfs.touch(&d, Some(when)).await.unwrap();
        let meta = lfs.metadata(&d).await.unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.modified, when);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_touch_read_only_file() {
        use std::os::unix::fs::PermissionsExt;
        let (tmp, lfs) = make_fs();
        let p = tmp.path().join("locked.txt");
        lfs.write(&p, b"x", WriteMode::Truncate).await.unwrap();
        std::fs::set_permissions(&p, std::fs::Permissions::from_mode(0o444)).unwrap();
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_300_000_000);
        lfs.touch(&p, Some(when)).await.unwrap();
        assert_eq!(lfs.metadata(&p).await.unwrap().modified, when);
        assert_eq!(lfs.read(&p).await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_rename() {
        let (tmp, lfs) = make_fs();
        let a = tmp.path().join("old.txt");
        let b = tmp.path().join("new.txt");
        lfs.write(&a, b"data", WriteMode::Truncate).await.unwrap();
        lfs.rename(&a, &b).await.unwrap();
        assert!(!lfs.exists(&a).await);
        assert_eq!(lfs.read(&b).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_rename_missing_source() {
        let (tmp, lfs) = make_fs();
        let err = lfs
            .rename(&tmp.path().join("x"), &tmp.path().join("y"))
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::NotFound(_)));
    }
}
