//! The agent — context assembly, the tool-calling loop, and subagents.
//!
//! `AgentLoop` consumes inbound messages from the bus and publishes
//! responses; `build_tool_registry` wires up the default tool set the loop
//! runs with. Everything here is channel-agnostic: adapters live in
//! `nanoclaw-channels`.

pub mod context;
mod loop_runner;
mod subagent;
mod tools;

pub use context::ContextBuilder;
pub use loop_runner::AgentLoop;
pub use subagent::{SpawnTool, SubagentManager};
pub use tools::{AddToMemoryTool, MessageTool, UpdatePersonaTool};

use nanoclaw_bus::MessageBus;
use nanoclaw_config::AppConfig;
use nanoclaw_core::Error;
use nanoclaw_core::provider::Provider;
use nanoclaw_core::tool::ToolRegistry;
use nanoclaw_tools::{FileReadTool, FileWriteTool, ShellTool, YoutubeTranscriptTool};
use std::path::Path;
use std::sync::Arc;

/// Build the default tool registry for the main agent loop.
///
/// Subagents get a reduced copy of this set: no `message` (they report via
/// the bus when they finish) and no `spawn` (no recursive spawning).
pub fn build_tool_registry(
    bus: MessageBus,
    provider: Arc<dyn Provider>,
    model: &str,
    workspace: &Path,
    config: &AppConfig,
) -> Result<Arc<ToolRegistry>, Error> {
    let subagent_tools = Arc::new(base_tools(workspace, config)?);
    let manager = Arc::new(SubagentManager::new(
        bus.clone(),
        provider,
        model,
        subagent_tools,
    ));

    let mut registry = base_tools(workspace, config)?;
    registry.register(Box::new(MessageTool::new(bus)))?;
    registry.register(Box::new(AddToMemoryTool::new(workspace)))?;
    registry.register(Box::new(UpdatePersonaTool::new(workspace)))?;
    registry.register(Box::new(SpawnTool::new(manager)))?;
    Ok(Arc::new(registry))
}

/// The tools both the main loop and subagents share.
fn base_tools(workspace: &Path, config: &AppConfig) -> Result<ToolRegistry, Error> {
    let mut registry = ToolRegistry::new();

    let allowed_roots = if config.shell.workspace_only {
        vec![workspace.to_string_lossy().into_owned()]
    } else {
        Vec::new()
    };
    let forbidden_paths = config.shell.forbidden_paths.clone();

    registry.register(Box::new(FileReadTool::with_restrictions(
        allowed_roots.clone(),
        forbidden_paths.clone(),
    )))?;
    registry.register(Box::new(FileWriteTool::with_restrictions(
        allowed_roots,
        forbidden_paths,
    )))?;

    registry.register(Box::new(ShellTool::new(config.shell.allowed_commands.clone())))?;
    registry.register(Box::new(YoutubeTranscriptTool::new()))?;

    Ok(registry)
}
