//! # NanoClaw Core
//!
//! Domain types, traits, and error definitions for the NanoClaw agent
//! orchestration engine. This crate has zero framework dependencies — it
//! defines the domain model all other crates implement against.
//!
//! Every subsystem seam is a trait here (`Provider`, `Tool`, `Channel`).
//! Implementations live in their respective crates, which keeps the
//! dependency graph pointing inward and makes the agent loop testable with
//! stub implementations.

pub mod channel;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use channel::Channel;
pub use error::{ChannelError, Error, ProviderError, Result, SessionError, ToolError};
pub use message::{
    ChatMessage, ContentPart, ImageUrl, InboundMessage, MessageContent, Origin, OutboundMessage,
    Role, SYSTEM_CHANNEL, ToolCall,
};
pub use provider::{ChatRequest, ChatResponse, Provider, ToolDefinition};
pub use tool::{InvocationContext, Tool, ToolRegistry};
