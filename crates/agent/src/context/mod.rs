//! Context assembly — turns workspace state and history into the message
//! list sent to the provider.
//!
//! Every model call sees exactly one system message (identity, persona,
//! bootstrap files, memory, skills), the session history verbatim, and the
//! current user turn. Attached media is inlined as base64 data URLs only
//! when the text asks for analysis; otherwise its presence is noted in text.

mod memory;
mod persona;
mod skills;

pub use memory::MemoryStore;
pub use persona::PersonaManager;
pub use skills::SkillsLoader;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Local;
use nanoclaw_core::message::{ChatMessage, ContentPart, ImageUrl, ToolCall};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bootstrap files folded into the system prompt, in load order.
const BOOTSTRAP_FILES: &[&str] = &["AGENTS.md", "SOUL.md", "USER.md", "TOOLS.md", "IDENTITY.md"];

/// Words that signal the user wants the attachment looked at.
const ANALYZE_KEYWORDS: &[&str] = &[
    "картинк",
    "изображен",
    "фото",
    "что на",
    "опиши",
    "покажи",
    "analyze",
    "image",
    "picture",
    "describe",
    "look at",
    "see",
    "gif",
    "гифк",
    "видео",
    "video",
];

pub struct ContextBuilder {
    workspace: PathBuf,
    memory: MemoryStore,
    skills: SkillsLoader,
    persona: PersonaManager,
    /// Per-file cap for inlined media.
    media_max_bytes: u64,
}

impl ContextBuilder {
    pub fn new(workspace: PathBuf, media_max_bytes: u64) -> Self {
        let memory = MemoryStore::new(&workspace);
        let skills = SkillsLoader::new(&workspace);
        let persona = PersonaManager::new(&workspace);
        Self {
            workspace,
            memory,
            skills,
            persona,
            media_max_bytes,
        }
    }

    /// The single system message for a model call.
    pub fn build_system_prompt(&self) -> String {
        let mut parts = vec![self.identity_block()];

        let persona = self.persona.get_persona();
        if !persona.trim().is_empty() {
            parts.push(format!("# Persona & Style\n\n{persona}"));
        }

        let bootstrap = self.load_bootstrap_files();
        if !bootstrap.is_empty() {
            parts.push(bootstrap);
        }

        let memory = self.memory.get_memory_context();
        if !memory.is_empty() {
            parts.push(format!("# Memory\n\n{memory}"));
        }

        let always_skills = self.skills.load_always_skills();
        if !always_skills.is_empty() {
            parts.push(format!("# Active Skills\n\n{always_skills}"));
        }

        let skills_summary = self.skills.build_summary();
        if !skills_summary.is_empty() {
            parts.push(format!(
                "# Skills\n\nThe following skills extend your capabilities. To use one, read its SKILL.md file with the file_read tool.\n\n{skills_summary}"
            ));
        }

        parts.join("\n\n---\n\n")
    }

    fn identity_block(&self) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M (%A)");
        let workspace = self.workspace.display();

        format!(
            "# NanoClaw\n\n\
             You are NanoClaw, a helpful AI assistant. You have access to tools that let you \
             read and write files, run shell commands, fetch YouTube transcripts, remember \
             facts, send messages to chat channels, and spawn subagents for background work.\n\n\
             ## Current Time\n{now}\n\n\
             ## Workspace\nYour workspace is at: {workspace}\n\
             - Long-term memory: {workspace}/memory/MEMORY.md\n\
             - Daily notes: {workspace}/memory/YYYY-MM-DD.md\n\
             - Skills: {workspace}/skills/<skill-name>/SKILL.md\n\n\
             When responding to direct questions, reply with plain text. Only use the \
             'message' tool to reach a different chat than the one you are answering; for \
             normal conversation just respond with text.\n\n\
             When you see a YouTube link, the transcript is usually extracted for you \
             automatically; base your summary on the actual transcript, never on guesses.\n\n\
             When you learn a durable fact about the user or their projects, save it with \
             'add_to_memory'. When you learn how they want you to sound, update \
             'update_persona'."
        )
    }

    fn load_bootstrap_files(&self) -> String {
        let parts: Vec<String> = BOOTSTRAP_FILES
            .iter()
            .filter_map(|filename| {
                let path = self.workspace.join(filename);
                let content = std::fs::read_to_string(&path).ok()?;
                Some(format!("## {filename}\n\n{content}"))
            })
            .collect();
        parts.join("\n\n")
    }

    /// Assemble the full message list: one system message, history verbatim,
    /// then the current user turn.
    pub fn build_messages(
        &self,
        history: Vec<ChatMessage>,
        current_message: &str,
        media: &[PathBuf],
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.build_system_prompt()));
        messages.extend(history);
        messages.push(self.build_user_message(current_message, media));
        messages
    }

    fn build_user_message(&self, text: &str, media: &[PathBuf]) -> ChatMessage {
        if media.is_empty() {
            return ChatMessage::user(text);
        }

        // Media is only inlined when the text asks for analysis; otherwise
        // the attachment is noted so the model knows it exists.
        let text_lower = text.to_lowercase();
        let should_analyze = ANALYZE_KEYWORDS.iter().any(|kw| text_lower.contains(kw));
        if !should_analyze {
            return ChatMessage::user(format!("{text}\n\n[{} file(s) attached]", media.len()));
        }

        let mut parts = Vec::new();
        for path in media {
            match self.encode_media(path) {
                Some(part) => parts.push(part),
                None => debug!(path = %path.display(), "Skipping non-inlinable attachment"),
            }
        }

        if parts.is_empty() {
            return ChatMessage::user(text);
        }

        parts.push(ContentPart::Text { text: text.into() });
        ChatMessage::user_parts(parts)
    }

    fn encode_media(&self, path: &Path) -> Option<ContentPart> {
        let mime = mime_for(path)?;

        let meta = std::fs::metadata(path).ok()?;
        if meta.len() > self.media_max_bytes {
            warn!(
                path = %path.display(),
                size = meta.len(),
                cap = self.media_max_bytes,
                "Attachment exceeds inline size cap, skipping"
            );
            return None;
        }

        let bytes = std::fs::read(path).ok()?;
        let b64 = BASE64.encode(&bytes);
        Some(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{mime};base64,{b64}"),
            },
        })
    }

    /// Append the assistant turn (text and/or tool calls) in place.
    pub fn add_assistant_message(
        &self,
        messages: &mut Vec<ChatMessage>,
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    ) {
        messages.push(ChatMessage::assistant(
            content.unwrap_or_default(),
            tool_calls,
        ));
    }

    /// Append one tool result correlated to its call id.
    pub fn add_tool_result(
        &self,
        messages: &mut Vec<ChatMessage>,
        tool_call_id: &str,
        tool_name: &str,
        result: &str,
    ) {
        messages.push(ChatMessage::tool_result(tool_call_id, tool_name, result));
    }
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "mp3" => Some("audio/mpeg"),
        "ogg" | "oga" => Some("audio/ogg"),
        "wav" => Some("audio/wav"),
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        _ => None,
    }
}
