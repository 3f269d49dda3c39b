//! graphclaw configuration
//!
//! Loaded from TOML at startup, falls back to defaults if the file is
//! missing or unreadable.

use graphclaw_discovery::DiscoveryAggregator;
use graphclaw_schema::ValidationPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "graphclaw.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphclawConfig {
    /// What the validation gate accepts.
    pub validation: ValidationPolicy,
    /// Batch assembly.
    pub aggregate: AggregateConfig,
    /// CLI output.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Merge nodes that share kind and identity.
    pub dedupe: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self { dedupe: true }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl GraphclawConfig {
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {} - using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// An empty aggregator set up from this config.
    pub fn aggregator(&self) -> DiscoveryAggregator {
        DiscoveryAggregator::new()
            .with_policy(self.validation.clone())
            .with_dedupe(self.aggregate.dedupe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GraphclawConfig::load(&dir.path().join("nope.toml"));
        assert!(!config.validation.allow_namespaced_kinds);
        assert!(config.aggregate.dedupe);
        assert!(config.output.pretty);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[validation]\nallow_namespaced_kinds = true").unwrap();
        let config = GraphclawConfig::load(file.path());
        assert!(config.validation.allow_namespaced_kinds);
        assert!(config.aggregate.dedupe);
    }

    #[test]
    fn invalid_file_gives_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[aggregate]\ndedupe = \"sometimes\"").unwrap();
        let config = GraphclawConfig::load(file.path());
        assert!(config.aggregate.dedupe);
    }

    #[test]
    fn default_toml_round_trips() {
        let text = GraphclawConfig::default().to_toml();
        assert!(text.contains("[validation]"));
        assert!(text.contains("dedupe = true"));
        let back: GraphclawConfig = toml::from_str(&text).unwrap();
        assert!(back.output.pretty);
    }
}
