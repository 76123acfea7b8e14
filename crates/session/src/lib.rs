//! Conversation sessions — one per `"channel:chat_id"` key.
//!
//! A session is the durable transcript of a chat. The store keeps live
//! sessions in memory behind a mutex and persists each one as a JSON file
//! under `<workspace>/sessions/`; `save` is the only durability point, so a
//! crash mid-turn loses at most the turn in flight.

use chrono::{DateTime, Utc};
use nanoclaw_core::error::SessionError;
use nanoclaw_core::message::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// One persisted conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl SessionMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The transcript for a single chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: String,
    pub messages: Vec<SessionMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn. History is unbounded at rest; callers window it via
    /// [`Session::history`].
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(SessionMessage::new(role, content));
        self.updated_at = Utc::now();
    }

    /// The most recent `limit` turns as provider-ready messages.
    pub fn history(&self, limit: usize) -> Vec<ChatMessage> {
        let start = self.messages.len().saturating_sub(limit);
        self.messages[start..]
            .iter()
            .map(|m| match m.role {
                Role::Assistant => ChatMessage::assistant(m.content.clone(), Vec::new()),
                Role::System => ChatMessage::system(m.content.clone()),
                _ => ChatMessage::user(m.content.clone()),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// In-memory session cache with lazy JSON file persistence.
pub struct SessionStore {
    dir: PathBuf,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    /// `dir` is the sessions directory, created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the session for `key`, loading it from disk if present,
    /// creating it fresh otherwise. Idempotent: concurrent callers observe
    /// one logical session per key.
    pub async fn get_or_create(&self, key: &str) -> Session {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(key) {
            return session.clone();
        }

        let session = match self.load_from_disk(key) {
            Some(s) => {
                debug!(key, messages = s.messages.len(), "Session loaded from disk");
                s
            }
            None => Session::new(key),
        };
        sessions.insert(key.to_string(), session.clone());
        session
    }

    /// Persist `session` to memory and disk. The sole durability point.
    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        {
            let mut sessions = self.sessions.lock().await;
            sessions.insert(session.key.clone(), session.clone());
        }

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| SessionError::Storage(format!("create sessions dir: {e}")))?;
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| SessionError::Storage(format!("serialize session: {e}")))?;
        std::fs::write(self.path_for(&session.key), json)
            .map_err(|e| SessionError::Storage(format!("write session file: {e}")))?;
        debug!(key = %session.key, messages = session.messages.len(), "Session saved");
        Ok(())
    }

    /// Drop a session from memory and disk.
    pub async fn clear(&self, key: &str) -> Result<(), SessionError> {
        self.sessions.lock().await.remove(key);
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| SessionError::Storage(format!("remove session file: {e}")))?;
        }
        Ok(())
    }

    /// Keys of every session on disk.
    pub fn list_keys(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                name.strip_suffix(".json").map(|s| s.replace('_', ":"))
            })
            .collect()
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }

    fn load_from_disk(&self, key: &str) -> Option<Session> {
        let path = self.path_for(key);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable session file");
                None
            }
        }
    }
}

/// Session keys contain `:` which is not filename-safe everywhere.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Default sessions directory under a workspace root.
pub fn sessions_dir(workspace: &Path) -> PathBuf {
    workspace.join("sessions")
}
