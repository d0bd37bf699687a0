//! File writer — write literal content to a path, creating parent directories.

use async_trait::async_trait;
use shellsmith_core::error::ToolError;
use shellsmith_core::tool::{Tool, ToolContext, required_str};
use tracing::{debug, warn};

pub const TOOL_NAME: &str = "writeFile";

#[derive(Debug, Default)]
pub struct WriteFileTool;

impl WriteFileTool {
    pub fn new() -> Self {
        Self
    }

    /// Overwrite `file_path` with `content`. I/O failures are returned as
    /// the message text, not as an error.
    pub async fn write(&self, ctx: &ToolContext, file_path: &str, content: &str) -> String {
        let resolved = ctx.resolve(file_path);

        if let Some(parent) = resolved.parent()
            && !tokio::fs::try_exists(parent).await.unwrap_or(false)
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            warn!(path = %parent.display(), error = %e, "Failed to create parent directory");
            return format!("Failed to create directory {}: {e}", parent.display());
        }

        match tokio::fs::write(&resolved, content).await {
            Ok(()) => {
                debug!(path = %resolved.display(), bytes = content.len(), "Wrote file");
                format!("Wrote file: {file_path}")
            }
            Err(e) => {
                warn!(path = %resolved.display(), error = %e, "Failed to write file");
                format!("Failed to write file {file_path}: {e}")
            }
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Writes content to a file. Use this to write HTML, CSS, or JavaScript code into files. \
         Creates missing parent folders and overwrites any existing file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filePath": {
                    "type": "string",
                    "description": "Path to the file to write."
                },
                "content": {
                    "type": "string",
                    "description": "The full content to write into the file."
                }
            },
            "required": ["filePath", "content"]
        })
    }

    fn result_label(&self) -> &str {
        "Write output"
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: &serde_json::Value,
    ) -> Result<String, ToolError> {
        let file_path = required_str(arguments, "filePath")?;
        let content = required_str(arguments, "content")?;
        Ok(self.write(ctx, file_path, content).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition() {
        let tool = WriteFileTool::new();
        assert_eq!(tool.name(), "writeFile");
        let schema = tool.parameters_schema();
        assert_eq!(schema["required"], serde_json::json!(["filePath", "content"]));
        assert!(schema["properties"]["filePath"].is_object());
        assert!(schema["properties"]["content"].is_object());
    }

    #[tokio::test]
    async fn write_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteFileTool::new();
        let output = tool
            .execute(
                &ToolContext::new(dir.path()),
                &serde_json::json!({
                    "filePath": "index.html",
                    "content": "<h1>Hello</h1>"
                }),
            )
            .await
            .unwrap();

        assert_eq!(output, "Wrote file: index.html");
        let content = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert_eq!(content, "<h1>Hello</h1>");
    }

    #[tokio::test]
    async fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteFileTool::new();
        let output = tool
            .write(&ToolContext::new(dir.path()), "site/css/style.css", "body {}")
            .await;

        assert!(output.starts_with("Wrote file"));
        let file_path = dir.path().join("site").join("css").join("style.css");
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "body {}");
    }

    #[tokio::test]
    async fn overwrite_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("script.js");
        std::fs::write(&file_path, "old content that is longer").unwrap();

        let tool = WriteFileTool::new();
        let abs = file_path.to_str().unwrap();
        tool.write(&ToolContext::new("/unused"), abs, "new").await;

        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "new");
    }

    #[tokio::test]
    async fn write_failure_is_returned_as_text() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should go makes the write fail
        std::fs::create_dir(dir.path().join("taken")).unwrap();

        let tool = WriteFileTool::new();
        let output = tool.write(&ToolContext::new(dir.path()), "taken", "x").await;
        assert!(output.starts_with("Failed to write file taken"), "{output}");
    }

    #[tokio::test]
    async fn missing_content_argument() {
        let tool = WriteFileTool::new();
        let result = tool
            .execute(
                &ToolContext::new(std::env::temp_dir()),
                &serde_json::json!({ "filePath": "a.txt" }),
            )
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
