//! `nanoclaw onboard` — First-time setup.

use nanoclaw_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let workspace_dir = AppConfig::workspace_dir();

    println!("NanoClaw — First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if !workspace_dir.exists() {
        std::fs::create_dir_all(&workspace_dir)?;
        println!("  Created workspace directory: {}", workspace_dir.display());
    }
    std::fs::create_dir_all(workspace_dir.join("memory"))?;
    std::fs::create_dir_all(workspace_dir.join("skills"))?;
    std::fs::create_dir_all(workspace_dir.join("sessions"))?;

    // Bootstrap files the context builder injects into every system prompt
    let bootstrap: &[(&str, &str)] = &[
        (
            "IDENTITY.md",
            concat!(
                "# Identity\n\n",
                "You are NanoClaw, a helpful AI assistant.\n\n",
                "You have access to tools (shell, file_read, file_write, spawn, message)\n",
                "that let you act on the user's behalf. Use them proactively when they\n",
                "would help accomplish the task.\n",
            ),
        ),
        (
            "AGENTS.md",
            concat!(
                "# Agent Guidelines\n\n",
                "- Prefer tools over guessing: read the file, run the command\n",
                "- Spawn a subagent for long or independent tasks\n",
                "- Keep responses focused on what the user asked\n",
            ),
        ),
        (
            "SOUL.md",
            concat!(
                "# Personality & Tone\n\n",
                "- Be concise and direct\n",
                "- Ask for clarification when the request is ambiguous\n",
                "- Be honest about limitations and uncertainties\n",
            ),
        ),
        (
            "USER.md",
            concat!(
                "# User Context\n\n",
                "<!-- Add information about yourself that the agent should know -->\n",
                "<!-- Examples: preferred languages, timezone, ongoing projects -->\n",
            ),
        ),
        (
            "TOOLS.md",
            concat!(
                "# Tool Notes\n\n",
                "<!-- Usage notes and conventions for specific tools -->\n",
            ),
        ),
    ];

    for (name, content) in bootstrap {
        let path = workspace_dir.join(name);
        if !path.exists() {
            std::fs::write(&path, content)?;
            println!("  Created {name}");
        }
    }

    if config_path.exists() {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("  Created config.toml at: {}", config_path.display());
        println!("\n  Next steps:");
        println!("    1. Edit {} and add your API key", config_path.display());
        println!("    2. Run: nanoclaw agent");
        println!("    3. Start chatting!\n");
    }

    println!("Setup complete. Run `nanoclaw agent` to start chatting.\n");

    Ok(())
}
