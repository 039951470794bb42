// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Tabletalk workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// --- Statement types ---

/// Opaque identifier for an in-flight asynchronous SQL execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementHandle(pub String);

/// Lifecycle status of a warehouse statement.
///
/// Pending statuses (`Submitted`, `Picked`, `Started`) are polled until the
/// statement reaches one of the terminal statuses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementStatus {
    Submitted,
    Picked,
    Started,
    Finished,
    Failed,
    Aborted,
}

impl StatementStatus {
    /// Returns true while the statement is still queued or running.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            StatementStatus::Submitted | StatementStatus::Picked | StatementStatus::Started
        )
    }

    /// Returns true once the engine will not change the status again.
    pub fn is_terminal(self) -> bool {
        !self.is_pending()
    }
}

/// Connection descriptor for the warehouse data API.
///
/// A cluster identifier selects the batch-capable path; a serverless
/// workgroup has no native batch submission and executes sequentially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Cluster(String),
    Workgroup(String),
}

/// Terminal or in-flight description of a statement, as reported by the engine.
#[derive(Debug, Clone)]
pub struct StatementDescription {
    pub id: String,
    pub status: StatementStatus,
    /// Engine error text, populated for FAILED/ABORTED statements.
    pub error: Option<String>,
    /// The SQL text the engine ran, when reported.
    pub query_string: Option<String>,
    /// Per-substatement descriptions for batch submissions.
    pub sub_statements: Vec<SubStatementDescription>,
}

/// Description of one substatement within a batch submission.
#[derive(Debug, Clone)]
pub struct SubStatementDescription {
    pub id: String,
    pub status: StatementStatus,
    pub error: Option<String>,
}

/// A single typed cell value in a result record.
///
/// The engine wraps each cell in exactly one populated variant.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Null,
}

impl FieldValue {
    /// Renders the cell for tabular text output. Nulls render empty.
    pub fn render(&self) -> String {
        match self {
            FieldValue::String(s) => s.clone(),
            FieldValue::Long(v) => v.to_string(),
            FieldValue::Double(v) => v.to_string(),
            FieldValue::Boolean(v) => v.to_string(),
            FieldValue::Null => String::new(),
        }
    }
}

/// Column metadata for a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub name: String,
}

/// Typed column/row records fetched for a finished statement.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub columns: Vec<ColumnMetadata>,
    pub records: Vec<Vec<FieldValue>>,
}

/// Outcome of a self-correcting query run.
///
/// `final_sql` equals the input SQL when the first execution succeeded, and
/// the last repaired statement otherwise.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub table_text: String,
    pub final_sql: String,
    pub repair_count: u32,
}

// --- Conversation types ---

/// A single message in a model conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    pub content: Vec<ChatBlock>,
}

impl ChatMessage {
    /// Convenience constructor for a plain text message.
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: vec![ChatBlock::Text { text: text.into() }],
        }
    }

    /// Concatenated text content, ignoring tool blocks.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ChatBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A typed content block within a conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatBlock {
    Text {
        text: String,
    },
    /// The model requested a tool invocation (assistant messages).
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// A tool invocation result sent back to the model (user messages).
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// A tool invocation requested by the model. Ephemeral -- exists only
/// within one control-loop turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// A tool definition advertised to the conversation model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// One assistant response from the conversation model: text plus any
/// requested tool calls.
#[derive(Debug, Clone)]
pub struct ModelTurn {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

// --- Session types ---

/// Persisted schema/sample context for a session, keyed by
/// (session_id, actor_id). Empty strings mean "not yet loaded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextCheckpoint {
    pub schema_text: String,
    pub sample_text: String,
}

/// A persisted conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub session_id: String,
    pub actor_id: String,
    /// Role: "user", "assistant", or "tool".
    pub role: String,
    pub content: String,
    pub created_at: String,
}
