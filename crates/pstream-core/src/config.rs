use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, StreamError};
use crate::types::StreamDescriptor;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default)]
    pub protocols: Vec<ProtocolConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub name: String,
    pub roots: Vec<PathBuf>,
    /// Protocols are read-only unless stated otherwise.
    #[serde(default)]
    pub writable: bool,
}

impl StreamConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StreamError::Config(e.to_string()))
    }

    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading stream config {}", path.display()))
            .map_err(|e| StreamError::Config(format!("{e:#}")))?;
        Self::from_json_str(&raw)
    }

    /// Validate every entry into a descriptor.
    pub fn descriptors(&self) -> Result<Vec<StreamDescriptor>> {
        self.protocols
            .iter()
            .map(|p| StreamDescriptor::new(p.name.clone(), p.roots.iter().cloned(), p.writable))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StreamRegistry;

    const SAMPLE: &str = r#"{
        "protocols": [
            { "name": "test", "roots": ["/srv/resources"], "writable": true },
            { "name": "test-read", "roots": ["/srv/resources", "/srv/fallback"] }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let cfg = StreamConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(cfg.protocols.len(), 2);
        assert!(cfg.protocols[0].writable);
        assert!(!cfg.protocols[1].writable);
        assert_eq!(cfg.protocols[1].roots.len(), 2);
    }

    #[test]
    fn test_empty_config() {
        let cfg = StreamConfig::from_json_str("{}").unwrap();
        assert!(cfg.protocols.is_empty());
        assert!(cfg.descriptors().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_config() {
        let err = StreamConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, StreamError::Config(_)));
    }

    #[test]
    fn test_invalid_descriptor_in_config() {
        let cfg = StreamConfig::from_json_str(
            r#"{ "protocols": [ { "name": "x", "roots": [] } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            cfg.descriptors(),
            Err(StreamError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_registry_from_config() {
        let cfg = StreamConfig::from_json_str(SAMPLE).unwrap();
        let reg = StreamRegistry::from_config(&cfg).unwrap();
        assert_eq!(reg.protocols(), vec!["test", "test-read"]);
    }

    #[test]
    fn test_registry_from_config_duplicate() {
        let cfg = StreamConfig::from_json_str(
            r#"{ "protocols": [
                { "name": "dup", "roots": ["/a"] },
                { "name": "dup", "roots": ["/b"] }
            ] }"#,
        )
        .unwrap();
        assert!(matches!(
            StreamRegistry::from_config(&cfg),
            Err(StreamError::DuplicateProtocol { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("streams.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = StreamConfig::from_file(&path).unwrap();
        assert_eq!(cfg.protocols[0].name, "test");
    }

    #[test]
    fn test_from_missing_file() {
        let err = StreamConfig::from_file("/definitely/not/here.json").unwrap_err();
        match err {
            StreamError::Config(msg) => assert!(msg.contains("reading stream config")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_serde_roundtrip() {
        let cfg = StreamConfig::from_json_str(SAMPLE).unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        let back = StreamConfig::from_json_str(&json).unwrap();
        assert_eq!(back.protocols.len(), 2);
    }
}
