//! Configuration snapshots for reproducibility.
//!
//! A snapshot captures the exact configuration an engine was built with,
//! so a run's decisions can be audited and replayed later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::engine::EngineConfig;
use crate::resolve::ConfigSource;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// SHA-256 of the raw config file content, if a file was loaded.
    #[serde(default)]
    pub file_hash: Option<String>,

    /// Path the config was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// Source of the configuration.
    pub source: String,

    /// SHA-256 of the effective (defaults-merged) config as JSON.
    pub effective_hash: String,

    /// The effective configuration.
    pub config: EngineConfig,
}

impl ConfigSnapshot {
    /// Create a snapshot of `config` as loaded from `path` with raw `content`.
    pub fn new(
        config: &EngineConfig,
        path: Option<&Path>,
        source: ConfigSource,
        content: Option<&str>,
    ) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            file_hash: content.map(hash_content),
            path: path.map(|p| p.display().to_string()),
            source: source.to_string(),
            effective_hash: effective_hash(config),
            config: config.clone(),
        }
    }

    /// Create a snapshot with only defaults (no config file loaded).
    pub fn defaults_only() -> Self {
        Self::new(
            &EngineConfig::default(),
            None,
            ConfigSource::BuiltinDefault,
            None,
        )
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot describes the same effective config as another.
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.effective_hash == other.effective_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.effective_hash[..12.min(self.effective_hash.len())]
    }
}

/// Hash of the config's canonical JSON form.
fn effective_hash(config: &EngineConfig) -> String {
    let canonical = serde_json::to_string(config).unwrap_or_default();
    hash_content(&canonical)
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_snapshot() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert!(snapshot.file_hash.is_none());
        assert_eq!(snapshot.source, "builtin default");
        assert_eq!(snapshot.config, EngineConfig::default());
    }

    #[test]
    fn test_snapshot_short_id() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.short_id().len(), 12);
    }

    #[test]
    fn test_snapshot_matches() {
        let s1 = ConfigSnapshot::defaults_only();
        let s2 = ConfigSnapshot::defaults_only();
        assert!(s1.matches(&s2));

        let tuned = EngineConfig::default().with_action_temperature(2.0);
        let s3 = ConfigSnapshot::new(&tuned, None, ConfigSource::CliArgument, None);
        assert!(!s1.matches(&s3));
    }

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex chars
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = ConfigSnapshot::defaults_only();
        let json = snapshot.to_json().unwrap();
        let restored = ConfigSnapshot::from_json(&json).unwrap();
        assert!(snapshot.matches(&restored));
    }
}
