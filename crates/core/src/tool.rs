//! Tool trait and registry — the abstraction over agent capabilities.
//!
//! Tools are long-lived singletons shared across all sessions. Anything
//! request-scoped (which chat asked, whether the caller is an admin) travels
//! in an `InvocationContext` argument rather than being set on the tool
//! between calls, so a tool instance is safe to share across chats.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use std::collections::HashMap;

/// Per-invocation request context.
///
/// Callers construct one per inbound message and pass it to every `execute`
/// in that turn.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    /// The channel the current turn belongs to
    pub channel: String,
    /// The chat to which replies and side effects should be scoped
    pub chat_id: String,
    /// The requesting user, when known
    pub user_id: String,
    /// Whether the requesting user is the bot owner/admin
    pub is_admin: bool,
}

impl InvocationContext {
    pub fn new(channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            user_id: String::new(),
            is_admin: false,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>, is_admin: bool) -> Self {
        self.user_id = user_id.into();
        self.is_admin = is_admin;
        self
    }
}

/// The core Tool trait.
///
/// Each tool implements this trait and is registered once at startup.
/// A tool is one capability: given validated arguments and a request
/// context, produce a string result or fail.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g. "shell", "file_read").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &InvocationContext,
    ) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// Holds tools in registration order so `definitions()` is stable across
/// calls — the same definition list is sent verbatim on every model call.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Duplicate names are a startup configuration error.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateName(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Execute a tool by name. Unknown names fail with `ToolError::NotFound`;
    /// whatever the tool itself raises is propagated unchanged. The registry
    /// never retries — error shielding is the agent loop's job.
    pub async fn execute(
        &self,
        name: &str,
        arguments: serde_json::Value,
        ctx: &InvocationContext,
    ) -> std::result::Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.execute(arguments, ctx).await
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
            _ctx: &InvocationContext,
        ) -> Result<String, ToolError> {
            Ok(arguments["text"].as_str().unwrap_or("").to_string())
        }
    }

    struct ContextEchoTool;

    #[async_trait]
    impl Tool for ContextEchoTool {
        fn name(&self) -> &str {
            "whoami"
        }
        fn description(&self) -> &str {
            "Reports the request context"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            _arguments: serde_json::Value,
            ctx: &InvocationContext,
        ) -> Result<String, ToolError> {
            Ok(format!("{}:{} admin={}", ctx.channel, ctx.chat_id, ctx.is_admin))
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        let err = registry.register(Box::new(EchoTool)).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateName(name) if name == "echo"));
    }

    #[test]
    fn definitions_preserve_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(ContextEchoTool)).unwrap();
        registry.register(Box::new(EchoTool)).unwrap();

        let defs = registry.definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "whoami");
        assert_eq!(defs[1].name, "echo");
        // Stable across calls
        let again = registry.definitions();
        assert_eq!(again[0].name, "whoami");
        assert_eq!(again[1].name, "echo");
    }

    #[tokio::test]
    async fn execute_passes_request_context() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(ContextEchoTool)).unwrap();

        let ctx = InvocationContext::new("telegram", "chat9").with_user("u1", true);
        let out = registry
            .execute("whoami", serde_json::json!({}), &ctx)
            .await
            .unwrap();
        assert_eq!(out, "telegram:chat9 admin=true");
    }

    #[tokio::test]
    async fn execute_unknown_tool_fails() {
        let registry = ToolRegistry::new();
        let ctx = InvocationContext::default();
        let err = registry
            .execute("nope", serde_json::json!({}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
