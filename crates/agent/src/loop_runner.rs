//! The agent loop — turns one inbound message into one response.
//!
//! For every message consumed from the bus: resolve the session, prepare the
//! user turn (channel-post framing, speaker prefix, eager YouTube
//! transcript), then iterate model call → tool execution until the model
//! answers in plain text or the iteration budget runs out. The session is
//! persisted exactly once per turn, after the loop.

use crate::context::ContextBuilder;
use nanoclaw_bus::MessageBus;
use nanoclaw_config::AgentConfig;
use nanoclaw_core::Error;
use nanoclaw_core::message::{InboundMessage, OutboundMessage, Role};
use nanoclaw_core::provider::{ChatRequest, Provider};
use nanoclaw_core::tool::{InvocationContext, ToolRegistry};
use nanoclaw_session::SessionStore;
use nanoclaw_tools::youtube::extract_video_id;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Degraded answer when the model call deadline elapses.
const TIMEOUT_FALLBACK: &str =
    "The model took too long to respond. Please try again in a moment.";

/// Answer of last resort: the loop never returns empty content.
const EMPTY_FALLBACK: &str = "I've completed processing but have no response to give.";

pub struct AgentLoop {
    bus: MessageBus,
    provider: Arc<dyn Provider>,
    sessions: Arc<SessionStore>,
    context: ContextBuilder,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_iterations: u32,
    user_turn_timeout: Duration,
    system_turn_timeout: Duration,
    history_window: usize,
    voice_phrases: Vec<String>,
}

impl AgentLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bus: MessageBus,
        provider: Arc<dyn Provider>,
        sessions: Arc<SessionStore>,
        context: ContextBuilder,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
        agent_config: &AgentConfig,
    ) -> Self {
        Self {
            bus,
            provider,
            sessions,
            context,
            tools,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_iterations: agent_config.max_iterations,
            user_turn_timeout: Duration::from_secs(agent_config.user_turn_timeout_secs),
            system_turn_timeout: Duration::from_secs(agent_config.system_turn_timeout_secs),
            history_window: agent_config.history_window,
            voice_phrases: agent_config.voice_trigger_phrases.clone(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Consume the inbound queue forever. Any per-message failure is logged
    /// and converted into a best-effort apology to the same chat; the loop
    /// itself never stops.
    pub async fn run(&self) {
        info!(model = %self.model, tools = self.tools.len(), "Agent loop started");
        loop {
            let msg = self.bus.consume_inbound().await;
            let (reply_channel, reply_chat) = reply_target(&msg);

            match self.process_message(msg).await {
                Ok(out) => self.bus.publish_outbound(out),
                Err(e) => {
                    error!(error = %e, channel = %reply_channel, "Message processing failed");
                    self.bus.publish_outbound(OutboundMessage::new(
                        &reply_channel,
                        &reply_chat,
                        "Sorry, something went wrong while processing your message. Please try again.",
                    ));
                }
            }
        }
    }

    /// Process one message directly, bypassing the bus (CLI one-shot mode).
    pub async fn process_direct(&self, content: &str) -> Result<String, Error> {
        let msg = InboundMessage::new("cli", "user", "direct", content);
        let out = self.process_message(msg).await?;
        Ok(out.content)
    }

    /// One full turn: prepare, iterate, persist, respond.
    pub async fn process_message(&self, mut msg: InboundMessage) -> Result<OutboundMessage, Error> {
        let is_system = msg.is_system();
        let (reply_channel, reply_chat) = reply_target(&msg);
        let session_key = format!("{reply_channel}:{reply_chat}");
        let turn_timeout = if is_system {
            self.system_turn_timeout
        } else {
            self.user_turn_timeout
        };

        info!(
            channel = %msg.channel,
            sender = %msg.sender_id,
            session = %session_key,
            "Processing message"
        );

        // Kept for voice detection and persistence before any rewrite.
        let original_content = msg.content.clone();

        // Channel posts are answered as public comments; this framing rewrite
        // is the one mutation applied to inbound content.
        if msg.meta_flag("is_channel_post") {
            let title = msg.meta_str("channel_title").unwrap_or("Unknown").to_string();
            msg.content = format!(
                "SYSTEM: You are commenting on a channel post in '{title}'. \
                 This is a PUBLIC comment visible to all channel subscribers. \
                 Respond directly to the post as a community member, not as an analyst \
                 reporting to someone.\n\nPOST CONTENT:\n{}\n\n\
                 Write your public comment below (keep it concise and engaging):",
                original_content
            );
            info!(channel_title = %title, "Processing channel post");
        }

        let mut session = self.sessions.get_or_create(&session_key).await;

        // In group chats the model needs to know who is talking.
        let mut current_message = if !is_system && msg.meta_flag("is_group") {
            if msg.meta_flag("is_admin") {
                format!("[Admin/Owner] {}", msg.content)
            } else {
                let username = msg
                    .meta_str("username")
                    .or_else(|| msg.meta_str("first_name"))
                    .unwrap_or("User");
                format!("[Community member: {username}] {}", msg.content)
            }
        } else if is_system {
            format!("[System: {}] {}", msg.sender_id, msg.content)
        } else {
            msg.content.clone()
        };

        // A shared YouTube link gets its transcript pulled up front so the
        // first model call already sees the real content. Failure is noted
        // inline and never aborts the turn.
        if !is_system
            && let Some(video_id) = extract_video_id(&msg.content)
            && let Some(youtube) = self.tools.get("youtube_transcript")
        {
            info!(video_id = %video_id, "YouTube link detected, extracting transcript");
            let ctx = InvocationContext::new(&reply_channel, &reply_chat);
            match youtube
                .execute(serde_json::json!({"url": msg.content}), &ctx)
                .await
            {
                Ok(transcript) => {
                    current_message.push_str("\n\n[Auto-extracted transcript below]\n");
                    current_message.push_str(&transcript);
                }
                Err(e) => {
                    warn!(error = %e, "YouTube transcript extraction failed");
                    current_message
                        .push_str(&format!("\n\n[Failed to extract YouTube transcript: {e}]"));
                }
            }
        }

        let mut messages = self.context.build_messages(
            session.history(self.history_window),
            &current_message,
            &msg.media,
        );

        let definitions = self.tools.definitions();
        let tool_ctx = InvocationContext::new(&reply_channel, &reply_chat).with_user(
            msg.meta_str("user_id").unwrap_or(&msg.sender_id),
            msg.meta_flag("is_admin"),
        );

        let mut final_content: Option<String> = None;

        for iteration in 1..=self.max_iterations {
            debug!(iteration, max = self.max_iterations, "Agent loop iteration");

            let request = ChatRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                tools: definitions.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            };

            let response =
                match tokio::time::timeout(turn_timeout, self.provider.chat(request)).await {
                    Ok(Ok(response)) => response,
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => {
                        error!(
                            timeout_secs = turn_timeout.as_secs(),
                            "Model call timed out, ending turn"
                        );
                        final_content = Some(TIMEOUT_FALLBACK.into());
                        break;
                    }
                };

            if !response.has_tool_calls() {
                final_content = response.content.filter(|c| !c.trim().is_empty());
                break;
            }

            let tool_calls = response.tool_calls.clone();
            debug!(count = tool_calls.len(), "Executing tool calls");
            self.context
                .add_assistant_message(&mut messages, response.content, tool_calls.clone());

            // Strictly sequential, in issued order. A failing call becomes
            // that call's result string; the turn goes on.
            for call in &tool_calls {
                info!(tool = %call.name, "Executing tool");
                let result = match self
                    .tools
                    .execute(&call.name, call.arguments.clone(), &tool_ctx)
                    .await
                {
                    Ok(output) => output,
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "Tool execution failed");
                        format!("Error executing tool: {e}")
                    }
                };
                self.context
                    .add_tool_result(&mut messages, &call.id, &call.name, &result);
            }

            if iteration == self.max_iterations {
                warn!(iterations = iteration, "Iteration budget exhausted");
            }
        }

        let final_content = final_content.unwrap_or_else(|| EMPTY_FALLBACK.into());

        // Exactly-once persistence: the user turn (as received, modulo the
        // channel-post framing) and the final answer, then save.
        let persisted_user = if is_system {
            format!("[System: {}] {}", msg.sender_id, msg.content)
        } else {
            msg.content.clone()
        };
        session.add_message(Role::User, persisted_user);
        session.add_message(Role::Assistant, final_content.clone());
        self.sessions.save(&session).await?;

        let mut out = OutboundMessage::new(&reply_channel, &reply_chat, final_content);

        if !is_system {
            // Voice delivery is keyed off the user's original words, not the
            // rewritten prompt.
            let original_lower = original_content.to_lowercase();
            if self
                .voice_phrases
                .iter()
                .any(|phrase| original_lower.contains(phrase.as_str()))
            {
                info!("Voice response requested");
                out.metadata.insert("voice".into(), serde_json::json!(true));
            }

            if let Some(inline_id) = msg.meta_str("inline_request_id") {
                out.metadata
                    .insert("inline_request_id".into(), serde_json::json!(inline_id));
            }

            out.reply_to = msg.meta_str("message_id").map(String::from);
        }

        Ok(out)
    }
}

/// Where the answer goes: system events route via their typed origin,
/// falling back to the CLI channel when the origin is missing.
fn reply_target(msg: &InboundMessage) -> (String, String) {
    if msg.is_system() {
        match &msg.origin {
            Some(origin) => (origin.channel.clone(), origin.chat_id.clone()),
            None => ("cli".into(), msg.chat_id.clone()),
        }
    } else {
        (msg.channel.clone(), msg.chat_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nanoclaw_core::error::{ProviderError, ToolError};
    use nanoclaw_core::message::{MessageContent, Origin, ToolCall};
    use nanoclaw_core::provider::ChatResponse;
    use nanoclaw_core::tool::Tool;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays scripted responses and records every request it saw.
    struct ScriptedProvider {
        script: Mutex<Vec<ChatResponse>>,
        requests: Mutex<Vec<ChatRequest>>,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn new(mut responses: Vec<ChatResponse>) -> Self {
            responses.reverse();
            Self {
                script: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request(&self, i: usize) -> ChatRequest {
            self.requests.lock().unwrap()[i].clone()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }
        fn default_model(&self) -> &str {
            "test-model"
        }
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.script.lock().unwrap().pop();
            // Repeat the last scripted response once the script runs dry, so
            // iteration-exhaustion tests can loop indefinitely.
            match next {
                Some(r) => {
                    if self.script.lock().unwrap().is_empty() {
                        self.script.lock().unwrap().push(r.clone());
                    }
                    Ok(r)
                }
                None => Err(ProviderError::MalformedResponse("script empty".into())),
            }
        }
    }

    /// Records call order; fails when constructed with `failing`.
    struct RecordingTool {
        name: String,
        calls: Arc<Mutex<Vec<String>>>,
        failing: bool,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            &self.name
        }
        fn description(&self) -> &str {
            "records calls"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
            _ctx: &InvocationContext,
        ) -> Result<String, ToolError> {
            let tag = arguments["tag"].as_str().unwrap_or("").to_string();
            self.calls.lock().unwrap().push(tag.clone());
            if self.failing {
                return Err(ToolError::ExecutionFailed {
                    tool_name: self.name.clone(),
                    reason: "simulated fault".into(),
                });
            }
            Ok(format!("done:{tag}"))
        }
    }

    struct Harness {
        bus: MessageBus,
        sessions: Arc<SessionStore>,
        agent: AgentLoop,
        provider: Arc<ScriptedProvider>,
        _tmp: TempDir,
    }

    fn harness(provider: ScriptedProvider, tools: ToolRegistry) -> Harness {
        harness_with_config(provider, tools, AgentConfig::default())
    }

    fn harness_with_config(
        provider: ScriptedProvider,
        tools: ToolRegistry,
        config: AgentConfig,
    ) -> Harness {
        let tmp = TempDir::new().unwrap();
        let bus = MessageBus::new();
        let sessions = Arc::new(SessionStore::new(tmp.path().join("sessions")));
        let provider = Arc::new(provider);
        let context = ContextBuilder::new(tmp.path().to_path_buf(), 1024 * 1024);
        let agent = AgentLoop::new(
            bus.clone(),
            provider.clone(),
            sessions.clone(),
            context,
            Arc::new(tools),
            "test-model",
            &config,
        );
        Harness {
            bus,
            sessions,
            agent,
            provider,
            _tmp: tmp,
        }
    }

    fn tool_call(id: &str, name: &str, tag: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: serde_json::json!({"tag": tag}),
        }
    }

    #[tokio::test]
    async fn single_call_turn_persists_user_and_assistant() {
        let h = harness(
            ScriptedProvider::new(vec![ChatResponse::text("hi there")]),
            ToolRegistry::new(),
        );

        let out = h
            .agent
            .process_message(InboundMessage::new("cli", "user", "direct", "hello"))
            .await
            .unwrap();

        assert_eq!(out.content, "hi there");
        assert_eq!(out.channel, "cli");
        assert_eq!(h.provider.request_count(), 1);

        let session = h.sessions.get_or_create("cli:direct").await;
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages[0].role, Role::User);
        assert_eq!(session.messages[0].content, "hello");
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert_eq!(session.messages[1].content, "hi there");
    }

    #[tokio::test]
    async fn tool_calls_run_sequentially_with_correlated_results() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut tools = ToolRegistry::new();
        tools
            .register(Box::new(RecordingTool {
                name: "probe".into(),
                calls: calls.clone(),
                failing: false,
            }))
            .unwrap();

        let h = harness(
            ScriptedProvider::new(vec![
                ChatResponse {
                    content: None,
                    tool_calls: vec![
                        tool_call("c1", "probe", "first"),
                        tool_call("c2", "probe", "second"),
                        tool_call("c3", "probe", "third"),
                    ],
                },
                ChatResponse::text("all done"),
            ]),
            tools,
        );

        let out = h
            .agent
            .process_message(InboundMessage::new("cli", "user", "direct", "probe them"))
            .await
            .unwrap();
        assert_eq!(out.content, "all done");

        // Issued order preserved.
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second", "third"]);

        // The second model call saw one result per call, correlated by id.
        let second = h.provider.request(1);
        let results: Vec<_> = second
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(results[0].content.as_text(), "done:first");
        assert_eq!(results[2].tool_call_id.as_deref(), Some("c3"));
    }

    #[tokio::test]
    async fn tool_failure_becomes_result_string() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut tools = ToolRegistry::new();
        tools
            .register(Box::new(RecordingTool {
                name: "flaky".into(),
                calls,
                failing: true,
            }))
            .unwrap();

        let h = harness(
            ScriptedProvider::new(vec![
                ChatResponse {
                    content: None,
                    tool_calls: vec![tool_call("c1", "flaky", "x")],
                },
                ChatResponse::text("recovered"),
            ]),
            tools,
        );

        let out = h
            .agent
            .process_message(InboundMessage::new("cli", "user", "direct", "try it"))
            .await
            .unwrap();
        assert_eq!(out.content, "recovered");

        let second = h.provider.request(1);
        let result = second
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(result.content.as_text().contains("Error executing tool"));
        assert!(result.content.as_text().contains("simulated fault"));
    }

    #[tokio::test]
    async fn unknown_tool_is_fault_isolated_too() {
        let h = harness(
            ScriptedProvider::new(vec![
                ChatResponse {
                    content: None,
                    tool_calls: vec![tool_call("c1", "no_such_tool", "x")],
                },
                ChatResponse::text("noted"),
            ]),
            ToolRegistry::new(),
        );

        let out = h
            .agent
            .process_message(InboundMessage::new("cli", "user", "direct", "go"))
            .await
            .unwrap();
        assert_eq!(out.content, "noted");

        let second = h.provider.request(1);
        let result = second
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(result.content.as_text().contains("Tool not found"));
    }

    #[tokio::test]
    async fn iteration_exhaustion_yields_fallback() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut tools = ToolRegistry::new();
        tools
            .register(Box::new(RecordingTool {
                name: "probe".into(),
                calls,
                failing: false,
            }))
            .unwrap();

        let mut config = AgentConfig::default();
        config.max_iterations = 3;

        // The provider keeps asking for tools forever.
        let h = harness_with_config(
            ScriptedProvider::new(vec![ChatResponse {
                content: None,
                tool_calls: vec![tool_call("c1", "probe", "again")],
            }]),
            tools,
            config,
        );

        let out = h
            .agent
            .process_message(InboundMessage::new("cli", "user", "direct", "loop"))
            .await
            .unwrap();
        assert_eq!(h.provider.request_count(), 3);
        assert!(!out.content.is_empty());
        assert_eq!(out.content, EMPTY_FALLBACK);
    }

    #[tokio::test]
    async fn empty_model_answer_gets_fallback() {
        let h = harness(
            ScriptedProvider::new(vec![ChatResponse {
                content: Some("   ".into()),
                tool_calls: vec![],
            }]),
            ToolRegistry::new(),
        );

        let out = h
            .agent
            .process_message(InboundMessage::new("cli", "user", "direct", "hi"))
            .await
            .unwrap();
        assert_eq!(out.content, EMPTY_FALLBACK);
    }

    #[tokio::test(start_paused = true)]
    async fn model_timeout_is_fatal_to_turn_with_degraded_answer() {
        let mut config = AgentConfig::default();
        config.user_turn_timeout_secs = 5;

        let h = harness_with_config(
            ScriptedProvider::new(vec![ChatResponse::text("too late")])
                .slow(Duration::from_secs(60)),
            ToolRegistry::new(),
            config,
        );

        let out = h
            .agent
            .process_message(InboundMessage::new("cli", "user", "direct", "hello"))
            .await
            .unwrap();
        assert_eq!(out.content, TIMEOUT_FALLBACK);

        // The turn still persisted exactly once.
        let session = h.sessions.get_or_create("cli:direct").await;
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn provider_error_propagates_for_apology_path() {
        // Empty script: the first call errors.
        let h = harness(ScriptedProvider::new(vec![]), ToolRegistry::new());
        let result = h
            .agent
            .process_message(InboundMessage::new("cli", "user", "direct", "hi"))
            .await;
        assert!(result.is_err());

        // Nothing persisted for a failed turn.
        let session = h.sessions.get_or_create("cli:direct").await;
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn channel_post_is_reframed_as_public_comment() {
        let h = harness(
            ScriptedProvider::new(vec![ChatResponse::text("nice post!")]),
            ToolRegistry::new(),
        );

        let mut msg = InboundMessage::new("telegram", "42", "chan9", "We shipped v2 today");
        msg.metadata
            .insert("is_channel_post".into(), serde_json::json!(true));
        msg.metadata
            .insert("channel_title".into(), serde_json::json!("Ship Log"));

        h.agent.process_message(msg).await.unwrap();

        let request = h.provider.request(0);
        let user_turn = request.messages.last().unwrap();
        let text = user_turn.content.as_text();
        assert!(text.contains("PUBLIC comment"));
        assert!(text.contains("Ship Log"));
        assert!(text.contains("We shipped v2 today"));
    }

    #[tokio::test]
    async fn group_messages_get_speaker_prefix() {
        let h = harness(
            ScriptedProvider::new(vec![
                ChatResponse::text("ok"),
                ChatResponse::text("ok"),
            ]),
            ToolRegistry::new(),
        );

        let mut admin = InboundMessage::new("telegram", "1", "g1", "deploy it");
        admin.metadata.insert("is_group".into(), serde_json::json!(true));
        admin.metadata.insert("is_admin".into(), serde_json::json!(true));
        h.agent.process_message(admin).await.unwrap();

        let mut member = InboundMessage::new("telegram", "2", "g1", "what is this bot?");
        member.metadata.insert("is_group".into(), serde_json::json!(true));
        member.metadata.insert("username".into(), serde_json::json!("alice"));
        h.agent.process_message(member).await.unwrap();

        let first = h.provider.request(0);
        assert!(first
            .messages
            .last()
            .unwrap()
            .content
            .as_text()
            .starts_with("[Admin/Owner] deploy it"));

        let second = h.provider.request(1);
        assert!(second
            .messages
            .last()
            .unwrap()
            .content
            .as_text()
            .starts_with("[Community member: alice] "));
    }

    #[tokio::test]
    async fn voice_request_sets_metadata_flag() {
        let h = harness(
            ScriptedProvider::new(vec![ChatResponse::text("here you go")]),
            ToolRegistry::new(),
        );

        let out = h
            .agent
            .process_message(InboundMessage::new(
                "telegram",
                "1",
                "c1",
                "reply with voice please",
            ))
            .await
            .unwrap();
        assert_eq!(out.metadata.get("voice"), Some(&serde_json::json!(true)));
    }

    #[tokio::test]
    async fn reply_and_inline_metadata_pass_through() {
        let h = harness(
            ScriptedProvider::new(vec![ChatResponse::text("answer")]),
            ToolRegistry::new(),
        );

        let mut msg = InboundMessage::new("telegram", "1", "c1", "question");
        msg.metadata
            .insert("message_id".into(), serde_json::json!("m-77"));
        msg.metadata
            .insert("inline_request_id".into(), serde_json::json!("iq-5"));

        let out = h.agent.process_message(msg).await.unwrap();
        assert_eq!(out.reply_to.as_deref(), Some("m-77"));
        assert_eq!(
            out.metadata.get("inline_request_id"),
            Some(&serde_json::json!("iq-5"))
        );
    }

    #[tokio::test]
    async fn system_event_routes_reply_via_origin() {
        let h = harness(
            ScriptedProvider::new(vec![ChatResponse::text("the feeds are quiet")]),
            ToolRegistry::new(),
        );

        let origin = Origin::new("telegram", "chat7");
        let msg = InboundMessage::system("subagent:ab12cd34", origin, "Subagent task completed.");

        let out = h.agent.process_message(msg).await.unwrap();
        assert_eq!(out.channel, "telegram");
        assert_eq!(out.chat_id, "chat7");
        assert!(out.reply_to.is_none());

        // Persisted into the origin's session, tagged as a system turn.
        let session = h.sessions.get_or_create("telegram:chat7").await;
        assert!(session.messages[0].content.starts_with("[System: subagent:ab12cd34]"));
    }

    #[tokio::test]
    async fn youtube_failure_still_reaches_model() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut tools = ToolRegistry::new();
        tools
            .register(Box::new(RecordingTool {
                name: "youtube_transcript".into(),
                calls: calls.clone(),
                failing: true,
            }))
            .unwrap();

        let h = harness(
            ScriptedProvider::new(vec![ChatResponse::text("could not fetch it, sorry")]),
            tools,
        );

        let out = h
            .agent
            .process_message(InboundMessage::new(
                "cli",
                "user",
                "direct",
                "summarize https://youtu.be/dQw4w9WgXcQ",
            ))
            .await
            .unwrap();
        assert_eq!(out.content, "could not fetch it, sorry");
        assert_eq!(calls.lock().unwrap().len(), 1);

        let request = h.provider.request(0);
        let user_turn = request.messages.last().unwrap();
        assert!(user_turn
            .content
            .as_text()
            .contains("Failed to extract YouTube transcript"));
    }

    #[tokio::test]
    async fn run_converts_failures_to_apology() {
        let h = harness(ScriptedProvider::new(vec![]), ToolRegistry::new());
        let bus = h.bus.clone();

        tokio::spawn(async move { h.agent.run().await });

        bus.publish_inbound(InboundMessage::new("cli", "user", "direct", "hi"));
        let out = tokio::time::timeout(Duration::from_secs(2), bus.consume_outbound())
            .await
            .unwrap();
        assert!(out.content.contains("Sorry"));
        assert_eq!(out.channel, "cli");
    }

    #[tokio::test]
    async fn history_replayed_on_next_turn() {
        let h = harness(
            ScriptedProvider::new(vec![
                ChatResponse::text("nice to meet you, sam"),
                ChatResponse::text("your name is sam"),
            ]),
            ToolRegistry::new(),
        );

        h.agent
            .process_message(InboundMessage::new("cli", "user", "direct", "my name is sam"))
            .await
            .unwrap();
        h.agent
            .process_message(InboundMessage::new("cli", "user", "direct", "what is my name?"))
            .await
            .unwrap();

        let second = h.provider.request(1);
        // System + 2 history turns + current user turn.
        assert_eq!(second.messages.len(), 4);
        assert_eq!(second.messages[1].content.as_text(), "my name is sam");
        assert!(matches!(second.messages[2].content, MessageContent::Text(_)));
        assert_eq!(second.messages[2].content.as_text(), "nice to meet you, sam");
    }
}
