//! File write tool — write content to a file with path validation.

use crate::path::validate_path;
use async_trait::async_trait;
use nanoclaw_core::error::ToolError;
use nanoclaw_core::tool::{InvocationContext, Tool};
use tracing::debug;

pub struct FileWriteTool {
    pub allowed_roots: Vec<String>,
    pub forbidden_paths: Vec<String>,
}

impl FileWriteTool {
    pub fn new() -> Self {
        Self {
            allowed_roots: Vec::new(),
            forbidden_paths: Vec::new(),
        }
    }

    pub fn with_restrictions(allowed_roots: Vec<String>, forbidden_paths: Vec<String>) -> Self {
        Self {
            allowed_roots,
            forbidden_paths,
        }
    }
}

impl Default for FileWriteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write content to a file at the given path, creating parent directories as needed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to write"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _ctx: &InvocationContext,
    ) -> Result<String, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        let resolved = validate_path(path, &self.allowed_roots, &self.forbidden_paths).map_err(
            |e| ToolError::PermissionDenied {
                tool_name: "file_write".into(),
                reason: e.to_string(),
            },
        )?;

        if let Some(parent) = resolved.parent()
            && !parent.exists()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: "file_write".into(),
                    reason: format!("create parent dirs: {e}"),
                })?;
        }

        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "file_write".into(),
                reason: e.to_string(),
            })?;

        debug!(path = %resolved.display(), bytes = content.len(), "File written");
        Ok(format!("Wrote {} bytes to {path}", content.len()))
    }
}
