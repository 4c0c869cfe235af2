//! Transcript message types.
//!
//! These types represent the ordered transcript entries for a notebook chat
//! session: user prompts, streaming assistant replies, and tool-call entries.
//! They power the chat view which renders the transcript as message bubbles
//! with attached document cards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reference citation attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Citation index as rendered inline (e.g. `[1]`).
    pub index: u32,
    /// Human-readable source label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Backend identifier of the source record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Quoted snippet backing the citation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A generated document artifact produced by an assistant tool call.
///
/// Displayed as a card attached to the assistant message that produced it.
/// A write is bound to at most one assistant message; rebinding the same
/// `write_id` replaces the previous record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteArtifact {
    /// Server-assigned document identifier.
    pub write_id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Document type (e.g. "note", "report").
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Size in bytes, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Execution status of a tool-call transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// Tool is executing; output not yet available.
    Running,
    /// Tool finished successfully.
    Done,
    /// Tool finished with an error.
    Error,
}

/// A user prompt. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub id: String,
    pub content: String,
    /// Ids of files attached to the prompt.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    /// Creation time (ms since Unix epoch).
    pub timestamp: u64,
}

/// A streaming assistant reply.
///
/// `content` grows via ordered appends during streaming and never shrinks
/// within a turn. `references` and `writes` may be populated asynchronously
/// after creation as side-channel events arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_questions: Vec<String>,
    /// Documents bound to this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub writes: Vec<WriteArtifact>,
    /// Whether the reply is still being generated.
    #[serde(default)]
    pub is_pending: bool,
    /// Creation time (ms since Unix epoch).
    pub timestamp: u64,
}

/// A tool-call transcript entry.
///
/// Created in `Running` state and transitioned exactly once to `Done` or
/// `Error`. The entry id doubles as the tool-call id; there is exactly one
/// entry per distinct tool-call id within a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMessage {
    /// Tool-call identifier (also the transcript entry id).
    pub id: String,
    pub tool_name: String,
    pub status: ToolStatus,
    /// Invocation arguments, attached at start.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub args: Value,
    /// Tool output, attached at completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Start time (ms since Unix epoch).
    pub started_at: u64,
    /// End time, set when the status transitions off `Running`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<u64>,
}

/// A transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
    Tool(ToolMessage),
}

impl UserMessage {
    /// Create a new user message with a fresh client-generated id.
    pub fn new(content: impl Into<String>, attachments: Vec<String>) -> Self {
        Self {
            id: format!("user-{}", uuid::Uuid::new_v4()),
            content: content.into(),
            attachments,
            timestamp: now_ms(),
        }
    }
}

impl AssistantMessage {
    /// Create an empty assistant message with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: String::new(),
            references: Vec::new(),
            suggested_questions: Vec::new(),
            writes: Vec::new(),
            is_pending: false,
            timestamp: now_ms(),
        }
    }

    /// Append streamed content. Content only ever grows within a turn.
    pub fn append_content(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    /// Bind a document artifact to this message.
    ///
    /// Idempotent per write id: rebinding replaces the existing record
    /// instead of duplicating it.
    pub fn bind_write(&mut self, write: WriteArtifact) {
        if let Some(existing) = self.writes.iter_mut().find(|w| w.write_id == write.write_id) {
            *existing = write;
        } else {
            self.writes.push(write);
        }
    }
}

impl ToolMessage {
    /// Create a tool entry in `Running` state.
    pub fn running(id: impl Into<String>, tool_name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            status: ToolStatus::Running,
            args,
            output: None,
            started_at: now_ms(),
            ended_at: None,
        }
    }

    /// Transition the entry to a terminal status with its output.
    pub fn complete(&mut self, status: ToolStatus, output: Value) {
        self.status = status;
        self.output = Some(output);
        self.ended_at = Some(now_ms());
    }
}

impl Message {
    /// Entry id: message id for user/assistant, tool-call id for tools.
    pub fn id(&self) -> &str {
        match self {
            Message::User(m) => &m.id,
            Message::Assistant(m) => &m.id,
            Message::Tool(m) => &m.id,
        }
    }

    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Message::Assistant(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_assistant_mut(&mut self) -> Option<&mut AssistantMessage> {
        match self {
            Message::Assistant(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_tool(&self) -> Option<&ToolMessage> {
        match self {
            Message::Tool(m) => Some(m),
            _ => None,
        }
    }
}

/// Get current time in milliseconds since Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
