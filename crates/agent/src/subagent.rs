//! Background subagents — fire-and-forget tasks that report back via the bus.
//!
//! A spawned subagent runs its own reduced tool-calling loop on an
//! independent tokio task, with no session and a trimmed registry (no
//! `message`, no `spawn`). Its only way to reach the user is the synthetic
//! `system` event it publishes when it finishes; the main loop picks that up
//! like any other inbound message and routes the reply via the typed origin.

use async_trait::async_trait;
use nanoclaw_bus::MessageBus;
use nanoclaw_core::error::ToolError;
use nanoclaw_core::message::{InboundMessage, Origin};
use nanoclaw_core::provider::{ChatRequest, Provider};
use nanoclaw_core::tool::{InvocationContext, Tool, ToolRegistry};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How many model calls a background task may make.
const SUBAGENT_MAX_ITERATIONS: u32 = 10;

pub struct SubagentManager {
    bus: MessageBus,
    provider: Arc<dyn Provider>,
    model: String,
    /// Trimmed registry for background work.
    tools: Arc<ToolRegistry>,
}

impl SubagentManager {
    pub fn new(
        bus: MessageBus,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            bus,
            provider,
            model: model.into(),
            tools,
        }
    }

    /// Launch a background task. Returns immediately with the task id; the
    /// result arrives later as a `system` event carrying `origin`.
    pub fn spawn(&self, task: String, origin: Origin) -> String {
        let task_id = Uuid::new_v4().to_string()[..8].to_string();
        info!(task_id = %task_id, origin = %origin.session_key(), "Spawning subagent");

        let bus = self.bus.clone();
        let provider = self.provider.clone();
        let model = self.model.clone();
        let tools = self.tools.clone();
        let id = task_id.clone();

        tokio::spawn(async move {
            let report = run_subagent(&id, &task, provider, &model, &tools, &origin).await;
            bus.publish_inbound(InboundMessage::system(
                format!("subagent:{id}"),
                origin,
                report,
            ));
        });

        task_id
    }
}

/// The reduced loop: no session, no pre-processing, just task → answer.
async fn run_subagent(
    task_id: &str,
    task: &str,
    provider: Arc<dyn Provider>,
    model: &str,
    tools: &ToolRegistry,
    origin: &Origin,
) -> String {
    let system = "You are a background task agent. Complete the given task using the \
                  available tools, then state the outcome concisely. You cannot talk to \
                  the user directly; your final text is delivered as a report."
        .to_string();

    let mut messages = vec![
        nanoclaw_core::message::ChatMessage::system(system),
        nanoclaw_core::message::ChatMessage::user(task),
    ];
    let definitions = tools.definitions();
    let ctx = InvocationContext::new(&origin.channel, &origin.chat_id);

    let mut final_content: Option<String> = None;

    for iteration in 1..=SUBAGENT_MAX_ITERATIONS {
        let request = ChatRequest {
            model: model.to_string(),
            messages: messages.clone(),
            tools: definitions.clone(),
            temperature: 0.7,
            max_tokens: None,
        };

        let response = match provider.chat(request).await {
            Ok(r) => r,
            Err(e) => {
                error!(task_id, error = %e, "Subagent model call failed");
                return format!("Subagent task '{task}' failed: {e}");
            }
        };

        if !response.has_tool_calls() {
            final_content = response.content;
            break;
        }

        let tool_calls = response.tool_calls.clone();
        messages.push(nanoclaw_core::message::ChatMessage::assistant(
            response.content.unwrap_or_default(),
            tool_calls.clone(),
        ));

        for call in &tool_calls {
            let result = match tools.execute(&call.name, call.arguments.clone(), &ctx).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(task_id, tool = %call.name, error = %e, "Subagent tool failed");
                    format!("Error executing tool: {e}")
                }
            };
            messages.push(nanoclaw_core::message::ChatMessage::tool_result(
                &call.id, &call.name, result,
            ));
        }

        if iteration == SUBAGENT_MAX_ITERATIONS {
            warn!(task_id, "Subagent hit iteration limit");
        }
    }

    let outcome = final_content
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "Task finished without a summary.".into());

    format!("Subagent task completed.\n\nTask: {task}\n\nResult:\n{outcome}")
}

/// The `spawn` tool the main loop registers.
pub struct SpawnTool {
    manager: Arc<SubagentManager>,
}

impl SpawnTool {
    pub fn new(manager: Arc<SubagentManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for SpawnTool {
    fn name(&self) -> &str {
        "spawn"
    }

    fn description(&self) -> &str {
        "Spawn a background subagent for a long or complex task. The result is reported back to this chat when it finishes."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "description": "A complete, self-contained description of the task"
                }
            },
            "required": ["task"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &InvocationContext,
    ) -> Result<String, ToolError> {
        let task = arguments["task"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'task' argument".into()))?;

        if ctx.channel.is_empty() || ctx.chat_id.is_empty() {
            return Err(ToolError::InvalidArguments(
                "No originating chat to report back to".into(),
            ));
        }

        let origin = Origin::new(&ctx.channel, &ctx.chat_id);
        let task_id = self.manager.spawn(task.to_string(), origin);
        Ok(format!(
            "Spawned subagent {task_id}. It will report back here when done."
        ))
    }
}
