//! `nanoclaw daemon` — Full runtime: channels, dispatcher, agent loop.

use super::Runtime;
use nanoclaw_channels::{CliChannel, dispatch_outbound};
use nanoclaw_config::AppConfig;
use nanoclaw_core::channel::Channel;
use std::sync::Arc;
use tracing::{error, info};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("NanoClaw Daemon — starting runtime");
    println!("   Provider: {}", config.default_provider);
    println!("   Model:    {}", config.default_model);

    let runtime = Runtime::build(config)?;
    runtime.spawn_agent();

    let mut channels: Vec<Arc<dyn Channel>> = Vec::new();
    let cli = Arc::new(CliChannel::new(runtime.bus.clone()));
    channels.push(cli.clone());

    tokio::spawn(dispatch_outbound(runtime.bus.clone(), channels));

    for channel in [cli] {
        let name = channel.name().to_string();
        tokio::spawn(async move {
            if let Err(e) = channel.start().await {
                error!(channel = %name, error = %e, "Channel stopped with error");
            }
        });
    }

    info!("Runtime started, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}
