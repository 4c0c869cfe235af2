//! History replay payloads.
//!
//! The history endpoint returns an ordered list of persisted messages plus the
//! documents generated during the session. The replay path reconstructs the
//! same transcript shape and document bindings live streaming would have
//! produced.

use crate::message::Reference;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
    Tool,
}

/// One persisted message from the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: String,
    pub role: HistoryRole,
    #[serde(default)]
    pub content: String,
    /// Attachment ids, user messages only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    /// Tool name, tool messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// "done" or "error", tool messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_questions: Vec<String>,
    /// Persisted creation time (ms since Unix epoch).
    #[serde(default)]
    pub timestamp: u64,
}

/// A previously generated document, as listed by the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub write_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Assistant message the document was bound to, when persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Tool call that produced the document, when persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Full history payload for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHistory {
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
    #[serde(default)]
    pub documents: Vec<HistoryDocument>,
}
