//! `nanoclaw agent` — Interactive or single-message chat mode.

use super::Runtime;
use nanoclaw_channels::{CliChannel, dispatch_outbound};
use nanoclaw_config::AppConfig;
use nanoclaw_core::channel::Channel;
use std::sync::Arc;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early so the error is actionable
    let needs_key = matches!(config.default_provider.as_str(), "openrouter" | "openai");
    if needs_key && config.api_key.is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...   (recommended)");
        eprintln!("    OPENAI_API_KEY=sk-...             (for OpenAI direct)");
        eprintln!("    NANOCLAW_API_KEY=sk-...           (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let runtime = Runtime::build(config)?;

    if let Some(msg) = message {
        // Single message mode, bypassing the bus
        eprint!("  Thinking...");
        let response = runtime.agent.process_direct(&msg).await?;
        eprint!("\r              \r");
        println!("{response}");
        return Ok(());
    }

    // Interactive mode: full bus wiring, stdin as the channel
    println!();
    println!("  NanoClaw — Interactive Mode");
    println!("  ---------------------------");
    println!("  Provider:  {}", runtime.config.default_provider);
    println!("  Model:     {}", runtime.model);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    runtime.spawn_agent();

    let channel = Arc::new(CliChannel::new(runtime.bus.clone()));
    tokio::spawn(dispatch_outbound(
        runtime.bus.clone(),
        vec![channel.clone() as Arc<dyn Channel>],
    ));

    // Blocks until the user exits or stdin closes
    channel.start().await?;

    println!();
    println!("  Goodbye!");
    Ok(())
}
