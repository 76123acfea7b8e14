//! Skill discovery — `skills/<name>/SKILL.md` files under the workspace.
//!
//! A skill file may start with a frontmatter block:
//!
//! ```text
//! ---
//! name: release-notes
//! description: Draft release notes from a changelog
//! always: true
//! ---
//! ```
//!
//! Skills tagged `always` are included in the system prompt in full; the
//! rest are listed by name and description, and the agent reads the file
//! on demand with `file_read`.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub always: bool,
    pub path: PathBuf,
}

pub struct SkillsLoader {
    skills_dir: PathBuf,
}

impl SkillsLoader {
    pub fn new(workspace: &Path) -> Self {
        Self {
            skills_dir: workspace.join("skills"),
        }
    }

    /// All discovered skills, sorted by name for stable prompt content.
    pub fn list_skills(&self) -> Vec<Skill> {
        let Ok(entries) = std::fs::read_dir(&self.skills_dir) else {
            return Vec::new();
        };

        let mut skills: Vec<Skill> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| {
                let skill_file = e.path().join("SKILL.md");
                let content = std::fs::read_to_string(&skill_file).ok()?;
                let dir_name = e.file_name().to_string_lossy().into_owned();
                Some(parse_skill(&dir_name, &skill_file, &content))
            })
            .collect();

        skills.sort_by(|a, b| a.name.cmp(&b.name));
        skills
    }

    /// One line per skill, for the system prompt.
    pub fn build_summary(&self) -> String {
        self.list_skills()
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full content of every `always`-tagged skill.
    pub fn load_always_skills(&self) -> String {
        self.list_skills()
            .iter()
            .filter(|s| s.always)
            .filter_map(|s| {
                let content = std::fs::read_to_string(&s.path).ok()?;
                Some(format!("## Skill: {}\n\n{}", s.name, strip_frontmatter(&content)))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn parse_skill(dir_name: &str, path: &Path, content: &str) -> Skill {
    let mut skill = Skill {
        name: dir_name.to_string(),
        description: String::new(),
        always: false,
        path: path.to_path_buf(),
    };

    if let Some(front) = frontmatter(content) {
        for line in front.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "name" => skill.name = value.to_string(),
                "description" => skill.description = value.to_string(),
                "always" => skill.always = value == "true",
                _ => {}
            }
        }
    }

    if skill.description.is_empty() {
        // First non-heading body line doubles as the description.
        skill.description = strip_frontmatter(content)
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .unwrap_or("(no description)")
            .to_string();
    }

    skill
}

fn frontmatter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---\n")?;
    let end = rest.find("\n---")?;
    Some(&rest[..end])
}

fn strip_frontmatter(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("---\n") else {
        return content;
    };
    match rest.find("\n---") {
        Some(end) => rest[end + 4..].trim_start_matches('\n'),
        None => content,
    }
}
