//! Shared wiring for the `agent` and `daemon` commands.

use nanoclaw_agent::{AgentLoop, ContextBuilder, build_tool_registry};
use nanoclaw_bus::MessageBus;
use nanoclaw_config::AppConfig;
use nanoclaw_core::provider::Provider;
use nanoclaw_session::{SessionStore, sessions_dir};
use std::sync::Arc;

/// Everything a running NanoClaw needs: the bus, the agent loop, and the
/// resolved configuration.
pub(crate) struct Runtime {
    pub bus: MessageBus,
    pub agent: Arc<AgentLoop>,
    pub config: AppConfig,
    pub model: String,
}

impl Runtime {
    /// Build the full runtime from the user's configuration.
    pub fn build(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        let provider = nanoclaw_providers::from_config(&config)?;
        let model = provider.default_model().to_string();
        let provider: Arc<dyn Provider> = Arc::new(provider);

        let workspace = AppConfig::workspace_dir();
        let bus = MessageBus::new();
        let sessions = Arc::new(SessionStore::new(sessions_dir(&workspace)));
        let context = ContextBuilder::new(workspace.clone(), config.agent.media_max_bytes);
        let tools = build_tool_registry(
            bus.clone(),
            provider.clone(),
            &model,
            &workspace,
            &config,
        )?;

        let agent = AgentLoop::new(
            bus.clone(),
            provider,
            sessions,
            context,
            tools,
            &model,
            &config.agent,
        )
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens);

        Ok(Self {
            bus,
            agent: Arc::new(agent),
            config,
            model,
        })
    }

    /// Spawn the agent loop as a background task.
    pub fn spawn_agent(&self) {
        let agent = self.agent.clone();
        tokio::spawn(async move { agent.run().await });
    }
}
