//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the run orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// How long the stub publisher takes to "publish" an approved run (milliseconds).
    #[serde(default = "default_publish_delay")]
    pub publish_delay_ms: u64,
}

fn default_publish_delay() -> u64 {
    2000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            publish_delay_ms: default_publish_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert_eq!(OrchestratorConfig::default().publish_delay_ms, 2000);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: OrchestratorConfig = toml::from_str("").unwrap();
        assert_eq!(config.publish_delay_ms, 2000);

        let config: OrchestratorConfig = toml::from_str("publish_delay_ms = 10").unwrap();
        assert_eq!(config.publish_delay_ms, 10);
    }
}
