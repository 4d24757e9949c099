use reelgate_core::{Config, SanitizedConfig, ToolRouter};

/// Shared application state
pub struct AppState {
    config: Config,
    tools: ToolRouter,
}

impl AppState {
    pub fn new(config: Config, tools: ToolRouter) -> Self {
        Self { config, tools }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn tools(&self) -> &ToolRouter {
        &self.tools
    }
}
