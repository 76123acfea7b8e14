//! File read tool — read file contents with path validation.

use crate::path::validate_path;
use async_trait::async_trait;
use nanoclaw_core::error::ToolError;
use nanoclaw_core::tool::{InvocationContext, Tool};

pub struct FileReadTool {
    /// Allowed root directories. Empty = allow all.
    pub allowed_roots: Vec<String>,
    /// Forbidden path prefixes.
    pub forbidden_paths: Vec<String>,
}

impl FileReadTool {
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

impl Default for FileReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file at the given path."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                }
            },
            "required": ["path"]
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

        let resolved = validate_path(path, &self.allowed_roots, &self.forbidden_paths).map_err(
            |e| ToolError::PermissionDenied {
                tool_name: "file_read".into(),
                reason: e.to_string(),
            },
        )?;

        match tokio::fs::read_to_string(&resolved).await {
            Ok(content) => Ok(content),
            Err(e) => Ok(format!("Failed to read file: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn tool_definition() {
        let tool = FileReadTool::new();
        assert_eq!(tool.name(), "file_read");
        let schema = tool.parameters_schema();
        assert_eq!(schema["required"], serde_json::json!(["path"]));
    }

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("test.txt");
        let mut f = std::fs::File::create(&file_path).unwrap();
        writeln!(f, "Hello, world!").unwrap();

        let tool = FileReadTool::new();
        let ctx = InvocationContext::default();
        let result = tool
            .execute(
                serde_json::json!({"path": file_path.to_str().unwrap()}),
                &ctx,
            )
            .await
            .unwrap();
        assert!(result.contains("Hello, world!"));
    }

    #[tokio::test]
    async fn read_nonexistent_file_is_soft_error() {
        let tool = FileReadTool::new();
        let ctx = InvocationContext::default();
        let result = tool
            .execute(
                serde_json::json!({"path": "/tmp/nanoclaw_test_nonexistent_12345.txt"}),
                &ctx,
            )
            .await
            .unwrap();
        assert!(result.contains("Failed to read file"));
    }

    #[tokio::test]
    async fn missing_path_argument() {
        let tool = FileReadTool::new();
        let ctx = InvocationContext::default();
        let result = tool.execute(serde_json::json!({}), &ctx).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn forbidden_path_blocked() {
        let tool = FileReadTool::with_restrictions(vec![], vec!["/etc".into()]);
        let ctx = InvocationContext::default();
        let result = tool
            .execute(serde_json::json!({"path": "/etc/shadow"}), &ctx)
            .await;
        assert!(matches!(result, Err(ToolError::PermissionDenied { .. })));
    }
}
