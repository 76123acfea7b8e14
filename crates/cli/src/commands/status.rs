//! `nanoclaw status` — Show system status.

use nanoclaw_config::AppConfig;
use nanoclaw_session::{SessionStore, sessions_dir};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let workspace = AppConfig::workspace_dir();
    let sessions = SessionStore::new(sessions_dir(&workspace));

    println!("NanoClaw Status");
    println!("===============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Workspace:    {}", workspace.display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    println!("  Temperature:  {}", config.default_temperature);
    println!("  Iterations:   {} max per message", config.agent.max_iterations);
    println!("  API key:      {}", if config.api_key.is_some() { "configured" } else { "missing" });
    println!("  Sessions:     {}", sessions.list_keys().len());

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file — run `nanoclaw onboard` first");
    }

    Ok(())
}
