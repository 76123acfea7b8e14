//! Orchestration-owned tools: outbound messaging and workspace memory.
//!
//! These live next to the loop because they need the bus or the context
//! collaborators; the generic tools (files, shell, YouTube) come from
//! `nanoclaw_tools`.

use crate::context::{MemoryStore, PersonaManager};
use async_trait::async_trait;
use nanoclaw_bus::MessageBus;
use nanoclaw_core::error::ToolError;
use nanoclaw_core::message::OutboundMessage;
use nanoclaw_core::tool::{InvocationContext, Tool};
use std::path::Path;
use tracing::info;

/// Send a message to a chat channel through the bus.
///
/// Defaults to the chat the current turn came from; explicit channel and
/// chat_id arguments override the routing.
pub struct MessageTool {
    bus: MessageBus,
}

impl MessageTool {
    pub fn new(bus: MessageBus) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl Tool for MessageTool {
    fn name(&self) -> &str {
        "message"
    }

    fn description(&self) -> &str {
        "Send a message to a chat channel. Defaults to the current chat; pass channel and chat_id to reach another one."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The message text to send"
                },
                "channel": {
                    "type": "string",
                    "description": "Target channel (defaults to the current one)"
                },
                "chat_id": {
                    "type": "string",
                    "description": "Target chat within the channel (defaults to the current one)"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &InvocationContext,
    ) -> Result<String, ToolError> {
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        let channel = arguments["channel"]
            .as_str()
            .unwrap_or(&ctx.channel)
            .to_string();
        let chat_id = arguments["chat_id"]
            .as_str()
            .unwrap_or(&ctx.chat_id)
            .to_string();

        if channel.is_empty() || chat_id.is_empty() {
            return Err(ToolError::InvalidArguments(
                "No target chat: pass channel and chat_id".into(),
            ));
        }

        info!(channel = %channel, chat = %chat_id, "message tool sending");
        self.bus
            .publish_outbound(OutboundMessage::new(&channel, &chat_id, content));
        Ok(format!("Message sent to {channel}:{chat_id}."))
    }
}

/// Append a fact to long-term memory (`memory/MEMORY.md`).
pub struct AddToMemoryTool {
    memory: MemoryStore,
}

impl AddToMemoryTool {
    pub fn new(workspace: &Path) -> Self {
        Self {
            memory: MemoryStore::new(workspace),
        }
    }
}

#[async_trait]
impl Tool for AddToMemoryTool {
    fn name(&self) -> &str {
        "add_to_memory"
    }

    fn description(&self) -> &str {
        "Add important facts, context, or learnings to long-term memory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The content to add to memory."
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _ctx: &InvocationContext,
    ) -> Result<String, ToolError> {
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        self.memory.append_entry(content);
        Ok("Successfully added to long-term memory.".into())
    }
}

/// Replace the persona file (`PERSONA.md`) with new style guidance.
pub struct UpdatePersonaTool {
    persona: PersonaManager,
}

impl UpdatePersonaTool {
    pub fn new(workspace: &Path) -> Self {
        Self {
            persona: PersonaManager::new(workspace),
        }
    }
}

#[async_trait]
impl Tool for UpdatePersonaTool {
    fn name(&self) -> &str {
        "update_persona"
    }

    fn description(&self) -> &str {
        "Update the agent's persona file with new style guidelines or character traits."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The full content of the persona file (markdown)."
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _ctx: &InvocationContext,
    ) -> Result<String, ToolError> {
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        self.persona.update_persona(content);
        Ok("Successfully updated persona.".into())
    }
}
