//! Protocol name → descriptor registry.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::info;

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::types::StreamDescriptor;

/// Registered protocols, shared between every component that issues operations.
///
/// Lookups hand out an `Arc` to the immutable descriptor, so the lock is only
/// held for the map access itself.
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: RwLock<HashMap<String, Arc<StreamDescriptor>>>,
}

static GLOBAL: LazyLock<Arc<StreamRegistry>> = LazyLock::new(|| Arc::new(StreamRegistry::new()));

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance for hosts that need ambient access.
    pub fn global() -> Arc<StreamRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Build a registry holding every protocol in `config`.
    pub fn from_config(config: &StreamConfig) -> Result<Self> {
        let registry = Self::new();
        for descriptor in config.descriptors()? {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Register a protocol. Fails if the name is already taken.
    pub fn register(&self, descriptor: StreamDescriptor) -> Result<Arc<StreamDescriptor>> {
        let mut streams = self.streams.write();
        if streams.contains_key(descriptor.name()) {
            return Err(StreamError::DuplicateProtocol {
                name: descriptor.name().to_string(),
            });
        }
        info!(
            protocol = descriptor.name(),
            roots = descriptor.roots().len(),
            writable = descriptor.is_writable(),
            "registered stream"
        );
        let descriptor = Arc::new(descriptor);
        streams.insert(descriptor.name().to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Remove a protocol. Unknown names are reported, not ignored.
    pub fn unregister(&self, name: &str) -> Result<Arc<StreamDescriptor>> {
        let removed = self.streams.write().remove(name);
        match removed {
            Some(descriptor) => {
                info!(protocol = name, "unregistered stream");
                Ok(descriptor)
            }
            None => Err(StreamError::UnknownProtocol { name: name.to_string() }),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<StreamDescriptor>> {
        self.streams
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StreamError::UnknownProtocol { name: name.to_string() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.streams.read().contains_key(name)
    }

    /// Registered protocol names, sorted.
    pub fn protocols(&self) -> Vec<String> {
        let mut names: Vec<String> = self.streams.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.read().is_empty()
    }
}
