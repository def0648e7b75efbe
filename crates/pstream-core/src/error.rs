use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Unknown protocol: {name}")]
    UnknownProtocol { name: String },
    #[error("Protocol already registered: {name}")]
    DuplicateProtocol { name: String },
    #[error("Path escapes the protocol roots: {0}")]
    ContainmentViolation(String),
    #[error("Protocol is read-only: {name}")]
    ReadOnlyViolation { name: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Directory not empty: {0}")]
    NotEmpty(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("Is a directory: {0}")]
    IsADirectory(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid stream descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("Directory session is closed")]
    SessionClosed,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StreamError {
    /// Translate a filesystem failure on `path` into the stream taxonomy.
    pub fn from_io(err: io::Error, path: impl Into<String>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            io::ErrorKind::DirectoryNotEmpty => Self::NotEmpty(path),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path),
            io::ErrorKind::IsADirectory => Self::IsADirectory(path),
            _ => Self::Io { path, source: err },
        }
    }

    /// Whether this is an ordinary operation failure rather than misuse of the API.
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::SessionClosed)
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        let kind = match &e {
            StreamError::UnknownProtocol { .. } | StreamError::NotFound(_) => {
                io::ErrorKind::NotFound
            }
            StreamError::DuplicateProtocol { .. } | StreamError::AlreadyExists(_) => {
                io::ErrorKind::AlreadyExists
            }
            StreamError::ContainmentViolation(_) | StreamError::ReadOnlyViolation { .. } => {
                io::ErrorKind::PermissionDenied
            }
            StreamError::NotEmpty(_) => io::ErrorKind::DirectoryNotEmpty,
            StreamError::NotADirectory(_) => io::ErrorKind::NotADirectory,
            StreamError::IsADirectory(_) => io::ErrorKind::IsADirectory,
            StreamError::InvalidPath(_)
            | StreamError::InvalidDescriptor(_)
            | StreamError::Config(_) => io::ErrorKind::InvalidInput,
            StreamError::SessionClosed => io::ErrorKind::Other,
            StreamError::Io { source, .. } => source.kind(),
        };
        match e {
            StreamError::Io { source, .. } => source,
            other => io::Error::new(kind, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
