// crates/devdesc-rs-quality/src/config.rs

//! Pipeline configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! worker_lanes = 8
//! busy_policy = "reject"
//!
//! [limits]
//! max_entries = 200
//!
//! [selection]
//! tie_break = "file_name"
//!
//! [diff]
//! cosmetic_weight = 0.25
//! ```

use crate::diff::DiffConfig;
use crate::ingest::{IngestionLimits, SelectionPolicy};
use crate::lifecycle::LifecycleConfig;
use crate::remediation::RemediationThresholds;
use devdesc_rs::ParseOptions;
use devdesc_rs_store::BusyPolicy;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub limits: IngestionLimits,
    pub selection: SelectionPolicy,
    pub diff: DiffConfig,
    pub remediation: RemediationThresholds,
    pub lifecycle: LifecycleConfig,
    /// Number of worker lanes; at least one is always started.
    pub worker_lanes: usize,
    pub busy_policy: BusyPolicy,
    /// Unresolved text or datatype references fail the parse instead of
    /// being reported as warnings.
    pub strict_references: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limits: IngestionLimits::default(),
            selection: SelectionPolicy::default(),
            diff: DiffConfig::default(),
            remediation: RemediationThresholds::default(),
            lifecycle: LifecycleConfig::default(),
            worker_lanes: 4,
            busy_policy: BusyPolicy::Block,
            strict_references: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::Toml)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&text)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            strict_references: self.strict_references,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read configuration: {}", e),
            ConfigError::Toml(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Toml(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::TieBreak;

    #[test]
    fn test_empty_file_is_default() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert!(config.parse_options().strict_references);
    }

    #[test]
    fn test_partial_override() {
        let config = PipelineConfig::from_toml_str(
            r#"
            worker_lanes = 8
            busy_policy = "reject"
            strict_references = false

            [limits]
            max_entries = 200

            [selection]
            tie_break = "file_name"

            [diff]
            cosmetic_weight = 0.25
            identity_keys = [["id"], ["code"]]
            "#,
        )
        .unwrap();
        assert_eq!(config.worker_lanes, 8);
        assert_eq!(config.busy_policy, BusyPolicy::Reject);
        assert_eq!(config.limits.max_entries, 200);
        assert_eq!(config.limits.max_input_bytes, IngestionLimits::default().max_input_bytes);
        assert_eq!(config.selection.tie_break, TieBreak::FileName);
        assert_eq!(config.diff.cosmetic_weight, 0.25);
        assert_eq!(config.diff.identity_keys.len(), 2);
        assert!(config.diff.weight_subtrees);
        assert!(!config.parse_options().strict_references);
    }

    #[test]
    fn test_unknown_tie_break_is_rejected() {
        let err = PipelineConfig::from_toml_str("[selection]\ntie_break = \"newest\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
