//! Audit log configuration
//!
//! Every knob has a default matching normal operation; a TOML file only
//! needs to name the keys it overrides.
//!
//! ```toml
//! max_entries = 20
//! debounce_ms = 1000
//! actor = "HR Officer"
//! ```

use crate::errors::{ExError, ExErrorKind, Result};
use crate::store::CAPACITY_PROBE_KEY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the audit log store, coalescer and service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditLogConfig {
    /// Per-entity history bound under normal operation
    pub max_entries: usize,
    /// Per-entity bound applied to every log by eviction tier 1
    pub tier1_entries: usize,
    /// Bound applied to the target log by eviction tier 2
    pub tier2_entries: usize,
    /// Per-entity cap of the non-persisted working set
    pub memory_entries: usize,
    /// Debounce quiescence window in milliseconds
    pub debounce_ms: u64,
    /// Unrelated keys above this size may be purged under pressure
    pub large_key_threshold_bytes: usize,
    /// Prefix of every audit log key in the backing store
    pub key_prefix: String,
    /// Actor recorded on entries
    pub actor: String,
    /// Fields that never produce entries
    pub denylist: Vec<String>,
}

impl Default for AuditLogConfig {
    fn default() -> Self {
        Self {
            max_entries: 20,
            tier1_entries: 10,
            tier2_entries: 5,
            memory_entries: 10,
            debounce_ms: 1000,
            large_key_threshold_bytes: 10 * 1024,
            key_prefix: "hr_audit_log:".to_string(),
            actor: "System Administrator".to_string(),
            denylist: ["id", "createdAt", "updatedAt", "picture"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AuditLogConfig {
    /// Parse a TOML document, filling unspecified keys with defaults
    ///
    /// # Errors
    ///
    /// `Config` if the document is not valid TOML, has mistyped keys, or
    /// fails [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AuditLogConfig = toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::Config)
                .with_op("config_parse")
                .with_message(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("config_load")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that the eviction tiers shrink monotonically and that the key
    /// prefix leaves the capacity probe key outside the log namespace
    ///
    /// # Errors
    ///
    /// `Config` if a bound is zero, a tier is larger than the one before
    /// it, or the prefix is empty or covers the probe key.
    pub fn validate(&self) -> Result<()> {
        let bounds_ok = self.tier2_entries > 0
            && self.tier2_entries <= self.tier1_entries
            && self.tier1_entries <= self.max_entries
            && self.memory_entries > 0;
        if !bounds_ok {
            return Err(ExError::new(ExErrorKind::Config)
                .with_op("config_validate")
                .with_message(format!(
                    "entry bounds must satisfy 0 < tier2 ({}) <= tier1 ({}) <= max ({}) and memory ({}) > 0",
                    self.tier2_entries, self.tier1_entries, self.max_entries, self.memory_entries
                )));
        }
        if self.key_prefix.is_empty() {
            return Err(ExError::new(ExErrorKind::Config)
                .with_op("config_validate")
                .with_message("key_prefix must not be empty"));
        }
        if CAPACITY_PROBE_KEY.starts_with(&self.key_prefix) {
            return Err(ExError::new(ExErrorKind::Config)
                .with_op("config_validate")
                .with_message(format!(
                    "key_prefix {:?} would cover the capacity probe key",
                    self.key_prefix
                )));
        }
        Ok(())
    }

    /// Whether a field is excluded from auditing
    pub fn is_denylisted(&self, field: &str) -> bool {
        self.denylist.iter().any(|d| d == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_normal_operation() {
        let config = AuditLogConfig::default();
        assert_eq!(config.max_entries, 20);
        assert_eq!(config.tier1_entries, 10);
        assert_eq!(config.tier2_entries, 5);
        assert_eq!(config.debounce_ms, 1000);
        assert_eq!(config.large_key_threshold_bytes, 10240);
        assert!(config.is_denylisted("picture"));
        assert!(!config.is_denylisted("name"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AuditLogConfig::from_toml_str("debounce_ms = 250\nactor = \"HR Officer\"")
            .unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.actor, "HR Officer");
        assert_eq!(config.max_entries, 20);
    }

    #[test]
    fn test_inverted_tiers_rejected() {
        let err = AuditLogConfig::from_toml_str("tier1_entries = 3\ntier2_entries = 8").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_prefix_covering_probe_key_rejected() {
        let err = AuditLogConfig::from_toml_str("key_prefix = \"__hrlog\"").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
        assert!(AuditLogConfig::from_toml_str("key_prefix = \"hr:\"").is_ok());
    }

    #[test]
    fn test_mistyped_key_rejected() {
        let err = AuditLogConfig::from_toml_str("max_entries = \"many\"").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_load_missing_file_is_io() {
        let err = AuditLogConfig::load("/definitely/not/here.toml").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Io);
    }
}
