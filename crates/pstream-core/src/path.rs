//! Lexical path resolution and root containment.
//!
//! Resolution never touches the filesystem: targets of mkdir, touch and
//! write need not exist yet. A `..` segment that would climb above the root
//! at any point is fatal, even when later segments would re-enter it.

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, StreamError};

/// An absolute path lexically contained in one of a protocol's roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    root_index: usize,
    root: PathBuf,
    path: PathBuf,
}

impl ResolvedPath {
    /// Index of the root in the descriptor's configured order.
    pub fn root_index(&self) -> usize {
        self.root_index
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path == self.root
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Maps protocol-relative paths onto configured roots.
pub struct PathResolver;

impl PathResolver {
    /// Collapse a protocol-relative path into its segments.
    ///
    /// Empty segments and `.` are dropped, so `./` and `.//a//b` normalize
    /// like `` and `a/b`. A leading `/` is treated as relative to the root.
    ///
    /// ```
    /// use pstream_core::path::PathResolver;
    ///
    /// assert_eq!(PathResolver::normalize(".//directory//file.ext").unwrap(), vec!["directory", "file.ext"]);
    /// assert_eq!(PathResolver::normalize("a/b/../c").unwrap(), vec!["a", "c"]);
    /// assert!(PathResolver::normalize("./directory/../../../file.ext").is_err());
    /// ```
    pub fn normalize(requested: &str) -> Result<Vec<&str>> {
        if requested.is_empty() {
            return Err(StreamError::InvalidPath("empty path".into()));
        }
        if requested.contains('\0') {
            return Err(StreamError::InvalidPath(format!(
                "path contains NUL byte: {requested:?}"
            )));
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in requested.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(StreamError::ContainmentViolation(requested.to_string()));
                    }
                }
                name => segments.push(name),
            }
        }
        Ok(segments)
    }

    /// Resolve `requested` against every root, in configured order.
    ///
    /// All candidates share the same normalized tail; callers pick the one
    /// whose target exists when the operation needs it.
    pub fn candidates(roots: &[PathBuf], requested: &str) -> Result<Vec<ResolvedPath>> {
        let segments = Self::normalize(requested)?;

        let mut out = Vec::with_capacity(roots.len());
        for (root_index, root) in roots.iter().enumerate() {
            let mut path = root.clone();
            path.extend(&segments);
            if !is_contained(root, &path) {
                continue;
            }
            out.push(ResolvedPath {
                root_index,
                root: root.clone(),
                path,
            });
        }

        if out.is_empty() {
            return Err(StreamError::ContainmentViolation(requested.to_string()));
        }
        Ok(out)
    }

    /// Resolve `requested` against the first root that contains it.
    pub fn resolve(roots: &[PathBuf], requested: &str) -> Result<ResolvedPath> {
        Self::candidates(roots, requested)?
            .into_iter()
            .next()
            .ok_or_else(|| StreamError::ContainmentViolation(requested.to_string()))
    }
}

/// `candidate` equals `root` or lies below it on a component boundary.
pub fn is_contained(root: &Path, candidate: &Path) -> bool {
    // Component-wise comparison: `/srv/data2` is not under `/srv/data`.
    candidate.starts_with(root)
        && !candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
}

/// Lexically normalize an absolute root: drop `.` and empty components,
/// collapse `..` without climbing above the filesystem root.
pub fn normalize_root(root: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in root.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}
