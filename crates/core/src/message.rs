//! Turn and History domain types.
//!
//! A `Turn` is one entry in the conversation: operator input, model text, or
//! the outcome of a tool call. The `History` is the ordered log of turns sent
//! in full with every model request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a turn is attributed to.
///
/// Tool results keep their own role here even though most model transports
/// have no matching role; adapters decide how to flatten it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The operator
    Human,
    /// The model
    Model,
    /// Output of a dispatched tool call
    ToolResult,
}

/// A single entry in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Who this turn is attributed to
    pub role: Role,

    /// Ordered text segments
    pub parts: Vec<String>,

    /// For tool results, the tool that produced the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn with_role(role: Role, text: String, tool_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            parts: vec![text],
            tool_name,
            timestamp: Utc::now(),
        }
    }

    /// Create a new operator turn.
    pub fn human(text: impl Into<String>) -> Self {
        Self::with_role(Role::Human, text.into(), None)
    }

    /// Create a new model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self::with_role(Role::Model, text.into(), None)
    }

    /// Create a tool result turn. `label` is the heading placed above the
    /// output, e.g. `"Command output"`.
    pub fn tool_result(
        tool_name: impl Into<String>,
        label: &str,
        output: impl AsRef<str>,
    ) -> Self {
        Self::with_role(
            Role::ToolResult,
            format!("{label}:\n{}", output.as_ref()),
            Some(tool_name.into()),
        )
    }

    /// All parts joined into one string.
    pub fn text(&self) -> String {
        self.parts.concat()
    }
}

/// The append-only conversation log.
///
/// Turns can be appended and read but never edited or removed. A `History`
/// lives for the whole process and is not persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of turns with the given role.
    pub fn count_role(&self, role: Role) -> usize {
        self.turns.iter().filter(|t| t.role == role).count()
    }
}
