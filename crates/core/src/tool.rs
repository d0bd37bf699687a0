//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are the side-effecting operations the model can ask for: running a
//! shell command batch or writing a file. The [`ToolRegistry`] holds the
//! declared capability set and dispatches calls to the matching tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::ToolError;
use crate::message::Turn;
use crate::provider::ToolDefinition;

/// A request from the model to execute a tool.
///
/// Built from a model response, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Per-invocation execution context, owned by the agent loop.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory every command runs in and relative paths resolve against
    pub working_dir: PathBuf,

    /// Optional wall-clock limit for a single command line
    pub command_timeout: Option<Duration>,
}

impl ToolContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            command_timeout: None,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Resolve `path` against the working directory. Absolute paths are
    /// returned unchanged.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

/// The core Tool trait.
///
/// `execute` returns `Err` only for malformed arguments. Failures of the
/// operation itself (non-zero exit, I/O errors) are reported as the output
/// text so the model can read them and adapt.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "executeCommand").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Heading placed above this tool's output when it is fed back.
    fn result_label(&self) -> &str {
        "Tool output"
    }

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: &serde_json::Value,
    ) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Read a required string argument.
pub fn required_str<'a>(
    arguments: &'a serde_json::Value,
    key: &str,
) -> std::result::Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

/// The declared set of callable tools, in registration order.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the model
/// 2. Dispatch a tool call and turn its output into a history entry
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the model).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Run a tool call and wrap its output as a tool-result turn.
    ///
    /// Empty output is reported as `"Done"`.
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        ctx: &ToolContext,
    ) -> std::result::Result<Turn, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let output = tool.execute(ctx, &call.arguments).await?;
        let output = if output.is_empty() { "Done".to_string() } else { output };
        Ok(Turn::tool_result(tool.name(), tool.result_label(), output))
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        fn result_label(&self) -> &str { "Echo output" }
        async fn execute(
            &self,
            _ctx: &ToolContext,
            arguments: &serde_json::Value,
        ) -> std::result::Result<String, ToolError> {
            Ok(required_str(arguments, "text")?.to_string())
        }
    }

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        registry.register(Box::new(EchoTool));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_definitions() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }

    #[tokio::test]
    async fn dispatch_wraps_output_in_tool_result_turn() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let call = ToolCall::new("echo", serde_json::json!({"text": "hello world"}));
        let turn = registry.dispatch(&call, &ctx()).await.unwrap();
        assert_eq!(turn.role, Role::ToolResult);
        assert_eq!(turn.text(), "Echo output:\nhello world");
    }

    #[tokio::test]
    async fn dispatch_reports_empty_output_as_done() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let call = ToolCall::new("echo", serde_json::json!({"text": ""}));
        let turn = registry.dispatch(&call, &ctx()).await.unwrap();
        assert_eq!(turn.text(), "Echo output:\nDone");
    }

    #[tokio::test]
    async fn dispatch_missing_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("nonexistent", serde_json::json!({}));
        let err = registry.dispatch(&call, &ctx()).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn dispatch_missing_argument() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let call = ToolCall::new("echo", serde_json::json!({}));
        let err = registry.dispatch(&call, &ctx()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn context_resolves_relative_paths() {
        let ctx = ToolContext::new("/work");
        assert_eq!(ctx.resolve("site/index.html"), PathBuf::from("/work/site/index.html"));
        let abs = std::env::temp_dir().join("x");
        assert_eq!(ctx.resolve(&abs), abs);
    }
}
