//! Operation dispatch: registry lookup, read-only enforcement, path
//! resolution, then the filesystem call.
//!
//! Checks run strictly in that order. A read-only or containment failure
//! returns before the filesystem is touched.

use pstream_core::error::{Result, StreamError};
use pstream_core::path::{PathResolver, ResolvedPath};
use pstream_core::registry::StreamRegistry;
use pstream_core::types::StreamDescriptor;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::directory::DirectorySession;
use crate::local_fs::{LocalFs, Metadata, RealFs, WriteMode};

/// A protocol-relative address, already split by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub protocol: String,
    pub path: String,
}

impl Target {
    pub fn new(protocol: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            path: path.into(),
        }
    }

    /// Split a `protocol://path` address.
    pub fn parse(address: &str) -> Result<Self> {
        let (protocol, path) = pstream_core::split_address(address)?;
        Ok(Self::new(protocol, path))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pstream_core::join_address(&self.protocol, &self.path))
    }
}

/// The closed set of operations a protocol supports.
#[derive(Debug, Clone)]
pub enum Operation {
    List { target: Target },
    Stat { target: Target },
    MkDir { target: Target, recursive: bool },
    RmDir { target: Target },
    Touch { target: Target, mtime: Option<SystemTime> },
    Unlink { target: Target },
    Read { target: Target },
    Write { target: Target, data: Vec<u8>, mode: WriteMode },
    Rename { from: Target, to: Target },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::Stat { .. } => "stat",
            Self::MkDir { .. } => "mkdir",
            Self::RmDir { .. } => "rmdir",
            Self::Touch { .. } => "touch",
            Self::Unlink { .. } => "unlink",
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
            Self::Rename { .. } => "rename",
        }
    }

    /// The addressed target; the source for `Rename`.
    pub fn target(&self) -> &Target {
        match self {
            Self::List { target }
            | Self::Stat { target }
            | Self::MkDir { target, .. }
            | Self::RmDir { target }
            | Self::Touch { target, .. }
            | Self::Unlink { target }
            | Self::Read { target }
            | Self::Write { target, .. } => target,
            Self::Rename { from, .. } => from,
        }
    }

    /// Whether the operation modifies the filesystem.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::List { .. } | Self::Stat { .. } | Self::Read { .. })
    }
}

/// Successful result of [`Dispatcher::dispatch`].
#[derive(Debug)]
pub enum Outcome {
    Directory(DirectorySession),
    Metadata(Metadata),
    Contents(Vec<u8>),
    Written(usize),
    Done,
}

/// Routes operations on `protocol://path` addresses to the real filesystem.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<StreamRegistry>,
    fs: Arc<dyn RealFs>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("fs", &"<dyn RealFs>")
            .finish()
    }
}

impl Dispatcher {
    /// Dispatcher over the local disk.
    pub fn new(registry: Arc<StreamRegistry>) -> Self {
        Self::with_fs(registry, Arc::new(LocalFs::new()))
    }

    pub fn with_fs(registry: Arc<StreamRegistry>, fs: Arc<dyn RealFs>) -> Self {
        Self { registry, fs }
    }

    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Single entry point for every operation kind.
    pub async fn dispatch(&self, op: Operation) -> Result<Outcome> {
        debug!(
            op = op.name(),
            protocol = %op.target().protocol,
            path = %op.target().path,
            mutating = op.is_mutating(),
            "dispatch"
        );
        let name = op.name();
        let outcome = match op {
            Operation::List { target } => self.list(&target).await.map(Outcome::Directory),
            Operation::Stat { target } => self.stat(&target).await.map(Outcome::Metadata),
            Operation::MkDir { target, recursive } => {
                self.mkdir(&target, recursive).await.map(|_| Outcome::Done)
            }
            Operation::RmDir { target } => self.rmdir(&target).await.map(|_| Outcome::Done),
            Operation::Touch { target, mtime } => {
                self.touch(&target, mtime).await.map(|_| Outcome::Done)
            }
            Operation::Unlink { target } => self.unlink(&target).await.map(|_| Outcome::Done),
            Operation::Read { target } => self.read(&target).await.map(Outcome::Contents),
            Operation::Write { target, data, mode } => self
                .write_with_mode(&target, &data, mode)
                .await
                .map(Outcome::Written),
            Operation::Rename { from, to } => self.rename(&from, &to).await.map(|_| Outcome::Done),
        };
        if let Err(e) = &outcome {
            if e.is_expected() {
                debug!(op = name, error = %e, "operation failed");
            } else {
                warn!(op = name, error = %e, "operation misused");
            }
        }
        outcome
    }

    /// Open a directory iteration session.
    pub async fn list(&self, target: &Target) -> Result<DirectorySession> {
        let stream = self.descriptor(target, false)?;
        let resolved = self.locate_existing(&stream, target).await?;
        let names = self.fs.read_dir(resolved.path()).await?;
        Ok(DirectorySession::new(resolved.into_path_buf(), names))
    }

    /// Every entry of a directory, `.` and `..` first.
    pub async fn scan_dir(&self, target: &Target) -> Result<Vec<String>> {
        let mut session = self.list(target).await?;
        let entries = session.remaining()?;
        session.close()?;
        Ok(entries)
    }

    pub async fn stat(&self, target: &Target) -> Result<Metadata> {
        let stream = self.descriptor(target, false)?;
        let resolved = self.locate_existing(&stream, target).await?;
        let meta = self.fs.metadata(resolved.path()).await?;
        debug!(%target, kind = meta.kind.as_str(), len = meta.len, "stat");
        Ok(meta)
    }

    /// Whether the target exists. Resolution failures count as absent.
    pub async fn exists(&self, target: &Target) -> bool {
        self.stat(target).await.is_ok()
    }

    pub async fn mkdir(&self, target: &Target, recursive: bool) -> Result<()> {
        let stream = self.descriptor(target, true)?;
        let resolved = self.locate_new(&stream, target).await?;
        self.fs.create_dir(resolved.path(), recursive).await
    }

    pub async fn rmdir(&self, target: &Target) -> Result<()> {
        let stream = self.descriptor(target, true)?;
        let resolved = self.locate_existing(&stream, target).await?;
        refuse_root(&resolved, target, "rmdir")?;
        self.fs.remove_dir(resolved.path()).await
    }

    pub async fn touch(&self, target: &Target, mtime: Option<SystemTime>) -> Result<()> {
        let stream = self.descriptor(target, true)?;
        let resolved = self.locate_new(&stream, target).await?;
        self.fs.touch(resolved.path(), mtime).await
    }

    pub async fn unlink(&self, target: &Target) -> Result<()> {
        let stream = self.descriptor(target, true)?;
        let resolved = self.locate_existing(&stream, target).await?;
        self.fs.remove_file(resolved.path()).await
    }

    pub async fn read(&self, target: &Target) -> Result<Vec<u8>> {
        let stream = self.descriptor(target, false)?;
        let resolved = self.locate_existing(&stream, target).await?;
        self.fs.read(resolved.path()).await
    }

    /// Create or overwrite; returns the number of bytes written.
    pub async fn write(&self, target: &Target, data: &[u8]) -> Result<usize> {
        self.write_with_mode(target, data, WriteMode::Truncate).await
    }

    pub async fn write_with_mode(
        &self,
        target: &Target,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<usize> {
        let stream = self.descriptor(target, true)?;
        let resolved = self.locate_new(&stream, target).await?;
        self.fs.write(resolved.path(), data, mode).await
    }

    /// Rename across one or two protocols. Both must be writable, and
    /// neither side may be a protocol root.
    pub async fn rename(&self, from: &Target, to: &Target) -> Result<()> {
        let from_stream = self.descriptor(from, true)?;
        let to_stream = self.descriptor(to, true)?;
        let source = self.locate_existing(&from_stream, from).await?;
        let destination = self.locate_new(&to_stream, to).await?;
        refuse_root(&source, from, "rename")?;
        refuse_root(&destination, to, "rename")?;
        // The source must exist even when the rename is a no-op.
        self.fs.metadata(source.path()).await?;
        if source.path() == destination.path() {
            debug!(%from, "rename onto itself");
            return Ok(());
        }
        self.fs.rename(source.path(), destination.path()).await
    }

    /// Registry lookup plus the read-only check for mutating operations.
    fn descriptor(&self, target: &Target, mutating: bool) -> Result<Arc<StreamDescriptor>> {
        let stream = self.registry.lookup(&target.protocol)?;
        if mutating && !stream.is_writable() {
            warn!(%target, "mutating operation on read-only stream");
            return Err(StreamError::ReadOnlyViolation {
                name: stream.name().to_string(),
            });
        }
        Ok(stream)
    }

    fn candidates(&self, stream: &StreamDescriptor, target: &Target) -> Result<Vec<ResolvedPath>> {
        PathResolver::candidates(stream.roots(), &target.path).inspect_err(|e| {
            if matches!(e, StreamError::ContainmentViolation(_)) {
                warn!(%target, "path escapes stream roots");
            }
        })
    }

    /// First root where the target exists, else the first root.
    async fn locate_existing(
        &self,
        stream: &StreamDescriptor,
        target: &Target,
    ) -> Result<ResolvedPath> {
        let candidates = self.candidates(stream, target)?;
        let index = if candidates.len() > 1 {
            self.first_existing(&candidates, false).await.unwrap_or(0)
        } else {
            0
        };
        pick(candidates, index, target)
    }

    /// First root where the target exists, else where its parent exists,
    /// else the first root.
    async fn locate_new(&self, stream: &StreamDescriptor, target: &Target) -> Result<ResolvedPath> {
        let candidates = self.candidates(stream, target)?;
        let index = if candidates.len() > 1 {
            match self.first_existing(&candidates, false).await {
                Some(i) => i,
                None => self.first_existing(&candidates, true).await.unwrap_or(0),
            }
        } else {
            0
        };
        pick(candidates, index, target)
    }

    async fn first_existing(&self, candidates: &[ResolvedPath], parent: bool) -> Option<usize> {
        for (i, candidate) in candidates.iter().enumerate() {
            let probe = if parent {
                match candidate.path().parent() {
                    Some(p) => p,
                    None => continue,
                }
            } else {
                candidate.path()
            };
            if self.fs.exists(probe).await {
                return Some(i);
            }
        }
        None
    }
}

/// Roots are the containment boundary; they cannot be removed or moved.
fn refuse_root(resolved: &ResolvedPath, target: &Target, op: &str) -> Result<()> {
    if resolved.is_root() {
        warn!(%target, op, "refusing to remove or move a protocol root");
        return Err(StreamError::InvalidPath(format!("{op} on protocol root: {target}")));
    }
    Ok(())
}

fn pick(candidates: Vec<ResolvedPath>, index: usize, target: &Target) -> Result<ResolvedPath> {
    candidates
        .into_iter()
        .nth(index)
        .ok_or_else(|| StreamError::ContainmentViolation(target.path.clone()))
}
