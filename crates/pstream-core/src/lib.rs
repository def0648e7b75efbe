//! Protocol streams: named virtual protocols confined to real filesystem roots.
//!
//! This crate holds the I/O-free half: descriptors, lexical path resolution,
//! the protocol registry and configuration. `pstream-fs` performs the actual
//! filesystem operations.

pub mod address;
pub mod config;
pub mod error;
pub mod path;
pub mod registry;
pub mod types;

pub use address::{join_address, split_address};
pub use config::{ProtocolConfig, StreamConfig};
pub use error::{Result, StreamError};
pub use path::{PathResolver, ResolvedPath};
pub use registry::StreamRegistry;
pub use types::{EntryKind, StreamDescriptor};
