//! Persona management — the agent's learned voice, kept in `PERSONA.md`.

use std::path::{Path, PathBuf};
use tracing::warn;

pub struct PersonaManager {
    persona_file: PathBuf,
}

impl PersonaManager {
    pub fn new(workspace: &Path) -> Self {
        Self {
            persona_file: workspace.join("PERSONA.md"),
        }
    }

    pub fn get_persona(&self) -> String {
        std::fs::read_to_string(&self.persona_file).unwrap_or_default()
    }

    pub fn update_persona(&self, content: &str) {
        if let Some(parent) = self.persona_file.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(error = %e, "Could not create workspace directory");
            return;
        }
        if let Err(e) = std::fs::write(&self.persona_file, content) {
            warn!(error = %e, "Could not write persona file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_persona_is_empty() {
        let tmp = TempDir::new().unwrap();
        let persona = PersonaManager::new(tmp.path());
        assert!(persona.get_persona().is_empty());
    }

    #[test]
    fn update_then_read() {
        let tmp = TempDir::new().unwrap();
        let persona = PersonaManager::new(tmp.path());
        persona.update_persona("# Style\n\nDirect and warm.");
        assert!(persona.get_persona().contains("Direct and warm."));
    }
}
