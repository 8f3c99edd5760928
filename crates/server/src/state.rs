use reelsmith_core::{Config, RunOrchestrator, SanitizedConfig};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<RunOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<RunOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &RunOrchestrator {
        self.orchestrator.as_ref()
    }
}
