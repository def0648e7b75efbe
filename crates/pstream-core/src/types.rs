use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, StreamError};
use crate::path::normalize_root;

/// Immutable configuration of one virtual protocol.
///
/// Construct with [`StreamDescriptor::new`], which validates the name and
/// lexically normalizes every root. Once handed to the registry the
/// descriptor is shared behind an `Arc` and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamDescriptor {
    name: String,
    roots: Vec<PathBuf>,
    writable: bool,
}

impl StreamDescriptor {
    pub fn new<I, P>(name: impl Into<String>, roots: I, writable: bool) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(StreamError::InvalidDescriptor("empty protocol name".into()));
        }
        if name.contains("://") {
            return Err(StreamError::InvalidDescriptor(format!(
                "protocol name must not contain '://': {name}"
            )));
        }

        let roots = roots
            .into_iter()
            .map(|root| {
                let root: PathBuf = root.into();
                if !root.is_absolute() {
                    return Err(StreamError::InvalidDescriptor(format!(
                        "root must be absolute: {}",
                        root.display()
                    )));
                }
                Ok(normalize_root(&root))
            })
            .collect::<Result<Vec<_>>>()?;
        if roots.is_empty() {
            return Err(StreamError::InvalidDescriptor(format!(
                "protocol {name} has no roots"
            )));
        }

        Ok(Self { name, roots, writable })
    }

    /// Writable descriptor over a single root.
    pub fn writable(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        Self::new(name, [root.into()], true)
    }

    /// Read-only descriptor over a single root.
    pub fn read_only(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        Self::new(name, [root.into()], false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Roots in the order they are tried.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

/// Kind of filesystem object behind a resolved path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
        }
    }
}
