//! Built-in tool implementations for shellsmith.
//!
//! - `executeCommand`: run a newline-separated batch of shell command lines
//! - `writeFile`: write literal content to a path
//!
//! Which of them the model sees is configuration, not code: build the
//! registry from the enabled capability list with [`registry_for`].

pub mod file_write;
pub mod shell;

use shellsmith_core::tool::{Tool, ToolRegistry};
use tracing::warn;

pub use file_write::WriteFileTool;
pub use shell::CommandExecutorTool;

/// Build a registry containing the named tools, in the order given.
///
/// Unknown names are skipped with a warning.
pub fn registry_for<S: AsRef<str>>(enabled: &[S]) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for name in enabled {
        let tool: Box<dyn Tool> = match name.as_ref() {
            shell::TOOL_NAME => Box::new(CommandExecutorTool::new()),
            file_write::TOOL_NAME => Box::new(WriteFileTool::new()),
            other => {
                warn!(tool = %other, "Ignoring unknown tool capability");
                continue;
            }
        };
        registry.register(tool);
    }
    registry
}

/// Create a registry with every built-in tool.
pub fn default_registry() -> ToolRegistry {
    registry_for(&[shell::TOOL_NAME, file_write::TOOL_NAME])
}
