//! Address-level facade: takes full `protocol://path` strings.

use pstream_core::error::Result;
use pstream_core::registry::StreamRegistry;
use std::sync::Arc;
use std::time::SystemTime;

use crate::directory::DirectorySession;
use crate::dispatcher::{Dispatcher, Target};
use crate::local_fs::{Metadata, WriteMode};

/// Splits addresses and forwards to a [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct StreamWrapper {
    dispatcher: Dispatcher,
}

impl StreamWrapper {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Wrapper over the local disk using `registry`.
    pub fn local(registry: Arc<StreamRegistry>) -> Self {
        Self::new(Dispatcher::new(registry))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn open_dir(&self, address: &str) -> Result<DirectorySession> {
        self.dispatcher.list(&Target::parse(address)?).await
    }

    pub async fn scan_dir(&self, address: &str) -> Result<Vec<String>> {
        self.dispatcher.scan_dir(&Target::parse(address)?).await
    }

    pub async fn stat(&self, address: &str) -> Result<Metadata> {
        self.dispatcher.stat(&Target::parse(address)?).await
    }

    pub async fn exists(&self, address: &str) -> bool {
        match Target::parse(address) {
            Ok(target) => self.dispatcher.exists(&target).await,
            Err(_) => false,
        }
    }

    pub async fn mkdir(&self, address: &str, recursive: bool) -> Result<()> {
        self.dispatcher.mkdir(&Target::parse(address)?, recursive).await
    }

    pub async fn rmdir(&self, address: &str) -> Result<()> {
        self.dispatcher.rmdir(&Target::parse(address)?).await
    }

    pub async fn touch(&self, address: &str, mtime: Option<SystemTime>) -> Result<()> {
        self.dispatcher.touch(&Target::parse(address)?, mtime).await
    }

    pub async fn unlink(&self, address: &str) -> Result<()> {
        self.dispatcher.unlink(&Target::parse(address)?).await
    }

    pub async fn read(&self, address: &str) -> Result<Vec<u8>> {
        self.dispatcher.read(&Target::parse(address)?).await
    }

    pub async fn read_string(&self, address: &str) -> Result<String> {
        let bytes = self.read(address).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn write(&self, address: &str, data: &[u8]) -> Result<usize> {
        self.dispatcher.write(&Target::parse(address)?, data).await
    }

    pub async fn append(&self, address: &str, data: &[u8]) -> Result<usize> {
        self.dispatcher
            .write_with_mode(&Target::parse(address)?, data, WriteMode::Append)
            .await
    }

    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = Target::parse(from)?;
        let to = Target::parse(to)?;
        self.dispatcher.rename(&from, &to).await
    }
}
