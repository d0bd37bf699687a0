//! The fixed instructions sent with every model request.
//!
//! The directive confines the model to static frontend sites, one command per
//! turn, and shell syntax that matches the host. The rule for writing file
//! contents follows whichever tools are enabled.

use std::fmt;

/// Rendered system directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemDirective {
    text: String,
}

impl SystemDirective {
    /// Render the directive for `os` (e.g. `"windows"`, `"linux"`) and the
    /// names of the enabled tools.
    pub fn build<S: AsRef<str>>(os: &str, capabilities: &[S]) -> Self {
        let has = |name: &str| capabilities.iter().any(|c| c.as_ref() == name);
        let can_write_files = has("writeFile");
        let windows = os.eq_ignore_ascii_case("windows");

        let mut text = String::from(
            "You are an assistant that builds simple frontend websites by executing terminal commands.\n\n",
        );

        text.push_str(&format!("ENVIRONMENT:\nOperating System: {os}\n\n"));

        text.push_str(
            "SCOPE:\n\
             - Allowed files: HTML, CSS, JavaScript only.\n\
             - Forbidden: package installs, frameworks, backend, databases, servers, node projects.\n\n",
        );

        text.push_str("COMMAND RULES:\n- One command at a time (never multiple).\n");
        if windows {
            text.push_str(
                "- Commands must be Windows-compatible (cmd).\n\
                 - Do not use Linux/Bash commands (touch, ls, rm).\n\
                 - Use only: mkdir, cd, type nul > filename.\n",
            );
        } else {
            text.push_str(
                "- Commands must be POSIX sh compatible.\n\
                 - Do not use Windows commands (type nul, dir, del).\n\
                 - Use only: mkdir, cd, touch filename.\n",
            );
        }
        text.push_str("- Never use heredoc syntax (cat <<EOF) or multi-line string tricks.\n");

        if can_write_files {
            text.push_str(
                "- Write file contents using the writeFile tool (do not use shell redirection).\n\n",
            );
        } else {
            text.push_str(
                "- Write file contents line by line:\n\
                 \x20   echo line1 > file\n\
                 \x20   echo line2 >> file\n\
                 \x20   echo line3 >> file\n\n",
            );
        }

        text.push_str(
            "WORKFLOW:\n\
             1) Create project folder.\n\
             2) Enter folder.\n\
             3) Create index.html, style.css, script.js.\n\
             4) Write HTML, then CSS, then JS.\n\n",
        );

        text.push_str("OUTPUT RULES:\n");
        if has("executeCommand") {
            text.push_str("- Use executeCommand for all commands.\n");
        }
        if can_write_files {
            text.push_str("- Use writeFile to add or update file contents.\n");
        }
        text.push_str(
            "- Wait for command output before next step.\n\
             - Do not repeat successful commands.\n\
             - Check existence before creating files/folders.\n\
             - Keep responses short and clear.\n\n",
        );

        text.push_str("GOAL:\nBuild a working frontend website using only HTML/CSS/JS.\n");

        Self { text }
    }

    /// Render the directive for the operating system this process runs on.
    pub fn for_host<S: AsRef<str>>(capabilities: &[S]) -> Self {
        Self::build(std::env::consts::OS, capabilities)
    }

    /// Use operator-supplied text verbatim.
    pub fn custom(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for SystemDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
