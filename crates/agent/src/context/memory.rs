//! Long-term memory — a human-editable markdown file plus daily notes.

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Reads and writes `memory/MEMORY.md` and `memory/YYYY-MM-DD.md` under
/// the workspace.
pub struct MemoryStore {
    memory_dir: PathBuf,
}

impl MemoryStore {
    pub fn new(workspace: &Path) -> Self {
        Self {
            memory_dir: workspace.join("memory"),
        }
    }

    pub fn long_term_path(&self) -> PathBuf {
        self.memory_dir.join("MEMORY.md")
    }

    fn today_note_path(&self) -> PathBuf {
        let today = Local::now().format("%Y-%m-%d");
        self.memory_dir.join(format!("{today}.md"))
    }

    pub fn read_long_term(&self) -> String {
        std::fs::read_to_string(self.long_term_path()).unwrap_or_default()
    }

    pub fn write_long_term(&self, content: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.memory_dir) {
            warn!(error = %e, "Could not create memory directory");
            return;
        }
        if let Err(e) = std::fs::write(self.long_term_path(), content) {
            warn!(error = %e, "Could not write long-term memory");
        }
    }

    /// Append one fact as a markdown bullet.
    pub fn append_entry(&self, entry: &str) {
        let current = self.read_long_term();
        let updated = if current.trim().is_empty() {
            format!("- {entry}")
        } else {
            format!("{current}\n\n- {entry}")
        };
        self.write_long_term(&updated);
    }

    /// The memory block for the system prompt: long-term memory plus
    /// today's note, if either exists.
    pub fn get_memory_context(&self) -> String {
        let mut parts = Vec::new();

        let long_term = self.read_long_term();
        if !long_term.trim().is_empty() {
            parts.push(long_term);
        }

        if let Ok(today) = std::fs::read_to_string(self.today_note_path())
            && !today.trim().is_empty()
        {
            parts.push(format!("## Today's Notes\n\n{today}"));
        }

        parts.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn append_creates_file_and_bullets() {
        let tmp = TempDir::new().unwrap();
        let store = MemoryStore::new(tmp.path());

        store.append_entry("the user prefers short answers");
        store.append_entry("project is called orion");

        let content = store.read_long_term();
        assert!(content.starts_with("- the user prefers short answers"));
        assert!(content.contains("- project is called orion"));
    }

    #[test]
    fn missing_memory_is_empty_context() {
        let tmp = TempDir::new().unwrap();
        let store = MemoryStore::new(tmp.path());
        assert!(store.get_memory_context().is_empty());
    }

    #[test]
    fn context_includes_todays_note() {
        let tmp = TempDir::new().unwrap();
        let store = MemoryStore::new(tmp.path());
        store.write_long_term("- known fact");

        let today = Local::now().format("%Y-%m-%d");
        std::fs::write(
            tmp.path().join("memory").join(format!("{today}.md")),
            "met with the team",
        )
        .unwrap();

        let ctx = store.get_memory_context();
        assert!(ctx.contains("known fact"));
        assert!(ctx.contains("Today's Notes"));
        assert!(ctx.contains("met with the team"));
    }
}
