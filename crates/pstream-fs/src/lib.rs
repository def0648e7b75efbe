//! Protocol stream filesystem layer.
//!
//! - [`Dispatcher`] — runs an [`Operation`] against a registered protocol
//! - [`DirectorySession`] — rewindable directory listing
//! - [`RealFs`] / [`LocalFs`] — the filesystem primitives underneath
//! - [`StreamWrapper`] — same operations addressed as `protocol://path`

pub mod directory;
pub mod dispatcher;
pub mod local_fs;
pub mod wrapper;

pub use directory::DirectorySession;
pub use dispatcher::{Dispatcher, Operation, Outcome, Target};
pub use local_fs::{LocalFs, Metadata, RealFs, WriteMode};
pub use wrapper::StreamWrapper;
