// Store configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Key prefix used by every versioned entry unless configured otherwise
pub const DEFAULT_PREFIX: &str = "ls";

/// Configuration for a versioned store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix of every namespaced key (`<prefix>__<version>__<name>`)
    pub prefix: String,
    /// Schema version addressed on startup
    pub version: u32,
    /// Expiry applied to writes without an explicit one. `None` never expires.
    pub default_expiry_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            version: 1,
            default_expiry_ms: None,
        }
    }
}

impl StoreConfig {
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn default_expiry(&self) -> Option<Duration> {
        self.default_expiry_ms.map(Duration::from_millis)
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, crate::DraftStoreError> {
        serde_json::from_str(json)
            .map_err(|e| crate::DraftStoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.prefix, "ls");
        assert_eq!(config.version, 1);
        assert!(config.default_expiry().is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = StoreConfig::from_json(r#"{"version": 3, "default_expiry_ms": 60000}"#).unwrap();
        assert_eq!(config.prefix, "ls");
        assert_eq!(config.version, 3);
        assert_eq!(config.default_expiry(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(StoreConfig::from_json("not json").is_err());
    }
}
