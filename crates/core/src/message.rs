//! Bus and chat message domain types.
//!
//! Two families of value objects live here:
//!
//! - `InboundMessage` / `OutboundMessage` travel on the message bus between
//!   channel adapters and the agent loop.
//! - `ChatMessage` is the role-tagged unit the agent loop assembles and the
//!   LLM provider consumes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The reserved channel name for synthetic background events
/// (subagent results, scheduled announces).
pub const SYSTEM_CHANNEL: &str = "system";

/// Typed routing token carried by synthetic system events so the agent loop
/// can route the eventual reply back to where the work was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// The channel the originating request arrived on.
    pub channel: String,
    /// The chat within that channel.
    pub chat_id: String,
}

impl Origin {
    pub fn new(channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
        }
    }

    /// The session key for this origin ("channel:chat_id").
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }
}

/// A message received from a channel adapter (or synthesized by the
/// subagent manager), consumed exactly once by the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The channel this message arrived on ("cli", "telegram", "system", ...)
    pub channel: String,

    /// Sender identifier (platform-specific user ID, or a subagent tag)
    pub sender_id: String,

    /// The chat/group/DM identifier within the channel
    pub chat_id: String,

    /// The text content
    pub content: String,

    /// Local paths of downloaded media attached to this message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<PathBuf>,

    /// Platform-specific metadata (is_group, is_admin, message_id, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// Routing token for system events. Always present when
    /// `channel == SYSTEM_CHANNEL`, absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

impl InboundMessage {
    pub fn new(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            media: Vec::new(),
            metadata: serde_json::Map::new(),
            origin: None,
        }
    }

    /// Create a synthetic system event reporting back to `origin`.
    pub fn system(
        sender_id: impl Into<String>,
        origin: Origin,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: SYSTEM_CHANNEL.into(),
            sender_id: sender_id.into(),
            chat_id: origin.session_key(),
            content: content.into(),
            media: Vec::new(),
            metadata: serde_json::Map::new(),
            origin: Some(origin),
        }
    }

    /// Whether this is a synthetic background event.
    pub fn is_system(&self) -> bool {
        self.channel == SYSTEM_CHANNEL
    }

    /// The session key this message belongs to. System events resolve to
    /// their origin's session so replies land in the right conversation.
    pub fn session_key(&self) -> String {
        match &self.origin {
            Some(origin) if self.is_system() => origin.session_key(),
            _ => format!("{}:{}", self.channel, self.chat_id),
        }
    }

    /// Look up a string metadata value.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Look up a boolean metadata flag, defaulting to false.
    pub fn meta_flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// A response produced by the agent loop, consumed exactly once by the
/// originating channel adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub chat_id: String,
    pub content: String,

    /// Platform message ID to reply to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,

    /// Delivery hints (voice flag, inline_request_id passthrough, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl OutboundMessage {
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            reply_to: None,
            metadata: serde_json::Map::new(),
        }
    }
}

// --- Chat messages (provider-facing) ---

/// The role of a message in the model conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message content — plain text, or multi-part when media is inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The textual portion of the content (first text part for multi-part).
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(t) => t,
            Self::Parts(parts) => parts
                .iter()
                .find_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .unwrap_or(""),
        }
    }
}

/// One part of a multi-part user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// A data URL (or remote URL) wrapper, as the OpenAI wire format expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// A model-requested invocation of a named tool with structured arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the provider's tool_call.id)
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// A single role-tagged message in the list sent to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    pub content: MessageContent,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Tool name, set on tool result messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// A multi-part user message (text + inlined media).
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
            tool_calls,
            tool_call_id: None,
            name: None,
        }
    }

    /// A tool result correlated to one tool call by id.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: MessageContent::Text(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            name: Some(tool_name.into()),
        }
    }
}
