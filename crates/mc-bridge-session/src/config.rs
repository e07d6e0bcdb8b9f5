//! Bridge configuration.

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub limits: LimitsSection,
    #[serde(default)]
    pub behavior: BehaviorSection,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitsSection {
    /// Requests accepted per inbound batch.
    #[serde(default = "default_max_requests")]
    pub max_requests_per_batch: usize,
    /// Sub-actions accepted per request.
    #[serde(default = "default_max_actions")]
    pub max_actions_per_request: usize,
}

fn default_max_requests() -> usize {
    32
}

fn default_max_actions() -> usize {
    64
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_requests_per_batch: default_max_requests(),
            max_actions_per_request: default_max_actions(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BehaviorSection {
    /// When false, claimed net ids are ignored instead of validated; for
    /// clients with known-broken id tracking.
    #[serde(default = "default_strict_net_ids")]
    pub strict_net_ids: bool,
}

fn default_strict_net_ids() -> bool {
    true
}

impl Default for BehaviorSection {
    fn default() -> Self {
        Self {
            strict_net_ids: default_strict_net_ids(),
        }
    }
}

impl BridgeConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let toml_str = r#"
            [logging]
            level = "debug"

            [limits]
            max_requests_per_batch = 8

            [behavior]
            strict_net_ids = false
        "#;
        let config: BridgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.limits.max_requests_per_batch, 8);
        assert_eq!(config.limits.max_actions_per_request, 64);
        assert!(!config.behavior.strict_net_ids);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: BridgeConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.limits.max_requests_per_batch, 32);
        assert!(config.behavior.strict_net_ids);
    }
}
