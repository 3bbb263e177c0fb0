use std::sync::Arc;
use std::time::Duration;

use napex_core::{Config, SanitizedConfig, TriggerOrchestrator};

use crate::sessions::SessionRegistry;

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<TriggerOrchestrator>,
    sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<TriggerOrchestrator>) -> Self {
        let sessions = SessionRegistry::new(Duration::from_secs(config.server.session_ttl_secs));
        Self {
            config,
            orchestrator,
            sessions,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &Arc<TriggerOrchestrator> {
        &self.orchestrator
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}
