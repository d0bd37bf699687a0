//! Command executor — run a batch of shell command lines.
//!
//! The `command` argument may hold several newline-separated lines. Each
//! non-blank line runs once, in order, in its own shell against the context's
//! working directory. `mkdir <dir>` lines whose target already exists are
//! skipped, so repeated directory creation never fails.

use async_trait::async_trait;
use shellsmith_core::error::ToolError;
use shellsmith_core::tool::{Tool, ToolContext, required_str};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

pub const TOOL_NAME: &str = "executeCommand";

/// Reported when no line produced any output.
const EMPTY_BATCH_OUTPUT: &str = "Command executed";

/// Runs shell command batches with the full privileges of the host process.
#[derive(Debug, Default)]
pub struct CommandExecutorTool;

/// What one line produced.
#[derive(Debug)]
enum LineOutcome {
    /// The line was not run because its directory already exists
    Skipped(String),
    /// The line ran; `text` is its combined output
    Ran { text: String, success: bool },
}

impl CommandExecutorTool {
    pub fn new() -> Self {
        Self
    }

    /// Run every line of `batch`, returning the aggregated output.
    ///
    /// A line exiting non-zero is reported and the batch continues. A line
    /// that cannot be spawned or times out stops the batch.
    pub async fn run_batch(&self, ctx: &ToolContext, batch: &str) -> String {
        let mut segments: Vec<String> = Vec::new();

        for line in batch.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match Self::run_line(ctx, line).await {
                Ok(LineOutcome::Skipped(name)) => {
                    debug!(dir = %name, "Skipping mkdir, directory exists");
                    segments.push(format!("Skipped: directory already exists ({name})"));
                }
                Ok(LineOutcome::Ran { text, success }) => {
                    if !success {
                        warn!(command = %line, "Command failed");
                    }
                    if !text.is_empty() {
                        segments.push(text);
                    }
                }
                Err(e) => {
                    warn!(command = %line, error = %e, "Command batch aborted");
                    segments.push(e.to_string());
                    break;
                }
            }
        }

        if segments.is_empty() {
            EMPTY_BATCH_OUTPUT.to_string()
        } else {
            segments.join("\n")
        }
    }

    async fn run_line(ctx: &ToolContext, line: &str) -> Result<LineOutcome, ToolError> {
        if let Some(dir) = mkdir_target(line) {
            let path = ctx.resolve(dir);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(LineOutcome::Skipped(dir.to_string()));
            }
        }

        debug!(command = %line, cwd = %ctx.working_dir.display(), "Executing command line");

        let mut command = shell_command(line, &ctx.working_dir);
        let output = match ctx.command_timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| ToolError::Timeout {
                    tool_name: TOOL_NAME.into(),
                    timeout_secs: limit.as_secs(),
                })?,
            None => command.output().await,
        }
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: TOOL_NAME.into(),
            reason: format!("{line}: {e}"),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = combine_streams(&stdout, &stderr);

        if output.status.success() {
            Ok(LineOutcome::Ran {
                text: combined,
                success: true,
            })
        } else {
            let code = output.status.code().unwrap_or(-1);
            let mut text = format!("Command failed: {line} (exit code {code})");
            if !combined.is_empty() {
                text.push('\n');
                text.push_str(&combined);
            }
            Ok(LineOutcome::Ran {
                text,
                success: false,
            })
        }
    }
}

/// `cmd` parses its own command line, so the line is passed through
/// unquoted there.
#[cfg(windows)]
fn shell_command(line: &str, cwd: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").raw_arg(line);
    command.current_dir(cwd).kill_on_drop(true);
    command
}

#[cfg(not(windows))]
fn shell_command(line: &str, cwd: &Path) -> Command {
    let mut command = Command::new("sh");
    command.args(["-c", line]);
    command.current_dir(cwd).kill_on_drop(true);
    command
}

/// Join stdout and stderr so neither is dropped.
fn combine_streams(stdout: &str, stderr: &str) -> String {
    let stdout = stdout.trim_end();
    let stderr = stderr.trim_end();
    match (stdout.is_empty(), stderr.is_empty()) {
        (true, true) => String::new(),
        (false, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{stdout}\n[stderr]: {stderr}"),
    }
}

/// The directory a `mkdir <dir>` line would create, with one layer of
/// surrounding quotes removed. Case-insensitive on the keyword.
fn mkdir_target(line: &str) -> Option<&str> {
    let keyword = line.get(..6)?;
    if !keyword.eq_ignore_ascii_case("mkdir ") {
        return None;
    }
    let arg = line[6..].trim();
    let arg = arg
        .strip_prefix(['"', '\''])
        .unwrap_or(arg);
    let arg = arg
        .strip_suffix(['"', '\''])
        .unwrap_or(arg);
    if arg.is_empty() { None } else { Some(arg) }
}

#[async_trait]
impl Tool for CommandExecutorTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Executes a shell/terminal command on the host and returns its output or error message. \
         Use it to create, update and delete files and folders, run scripts, and anything else \
         that can be done from a terminal."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute, such as 'dir' or 'mkdir new_folder'."
                }
            },
            "required": ["command"]
        })
    }

    fn result_label(&self) -> &str {
        "Command output"
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: &serde_json::Value,
    ) -> Result<String, ToolError> {
        let command = required_str(arguments, "command")?;
        Ok(self.run_batch(ctx, command).await)
    }
}
