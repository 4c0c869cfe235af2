//! Wire protocol for the streaming chat endpoint.
//!
//! The server streams newline-delimited frames, each a JSON object carrying a
//! `type` tag and, optionally, the id of the session it belongs to. Events
//! from a session other than the active one must be discarded by the
//! consumer; the per-event `session_id` is the guard against stale-stream
//! leakage after a session switch or a rapid cancel/retry.

use crate::message::Reference;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generation status reported by `session.status` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    /// The server is generating; no transcript mutation implied.
    Thinking,
    /// The turn finished; per-turn state should be cleared.
    Done,
}

/// One decoded frame from the streaming response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Server assigned the message id the next deltas will belong to.
    #[serde(rename = "message.start")]
    MessageStart {
        message_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    /// A chunk of assistant text.
    #[serde(rename = "delta")]
    Delta {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    /// A tool call began executing.
    #[serde(rename = "tool.start")]
    ToolStart {
        id: String,
        name: String,
        #[serde(default)]
        args: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    /// A tool call finished.
    #[serde(rename = "tool.end")]
    ToolEnd {
        id: String,
        name: String,
        /// "done" or "error".
        status: String,
        #[serde(default)]
        output: Value,
        /// Assistant message the tool's artifacts belong to, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    /// Citations for the current assistant reply.
    #[serde(rename = "references")]
    References {
        references: Vec<Reference>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    /// Follow-up questions suggested for the current reply.
    #[serde(rename = "suggested.questions")]
    SuggestedQuestions {
        questions: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    /// Turn lifecycle status change.
    #[serde(rename = "session.status")]
    SessionStatus {
        status: StreamStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    /// Server-reported error, surfaced in-transcript.
    #[serde(rename = "error")]
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
}

impl StreamEvent {
    /// Session the event belongs to, when the server tagged it.
    pub fn session_id(&self) -> Option<&str> {
        let sid = match self {
            StreamEvent::MessageStart { session_id, .. } => session_id,
            StreamEvent::Delta { session_id, .. } => session_id,
            StreamEvent::ToolStart { session_id, .. } => session_id,
            StreamEvent::ToolEnd { session_id, .. } => session_id,
            StreamEvent::References { session_id, .. } => session_id,
            StreamEvent::SuggestedQuestions { session_id, .. } => session_id,
            StreamEvent::SessionStatus { session_id, .. } => session_id,
            StreamEvent::Error { session_id, .. } => session_id,
        };
        sid.as_deref()
    }
}

/// Request body for opening a streaming chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRequest {
    /// User prompt text.
    pub text: String,
    /// Attachment ids.
    #[serde(default)]
    pub files: Vec<String>,
    pub session_id: String,
    pub assistant_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_start() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"message.start","message_id":"m1"}"#).unwrap();

        match event {
            StreamEvent::MessageStart { message_id, session_id } => {
                assert_eq!(message_id, "m1");
                assert!(session_id.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_delta_with_session() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"delta","text":"Hi","session_id":"s1"}"#).unwrap();

        assert_eq!(event.session_id(), Some("s1"));
        match event {
            StreamEvent::Delta { text, .. } => assert_eq!(text, "Hi"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_tool_end_defaults() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"type":"tool.end","id":"t1","name":"search","status":"done"}"#,
        )
        .unwrap();

        match event {
            StreamEvent::ToolEnd { id, output, message_id, .. } => {
                assert_eq!(id, "t1");
                assert!(output.is_null());
                assert!(message_id.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_references() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"type":"references","references":[{"index":1,"source":"notes.md"}]}"#,
        )
        .unwrap();

        match event {
            StreamEvent::References { references, .. } => {
                assert_eq!(references.len(), 1);
                assert_eq!(references[0].index, 1);
                assert_eq!(references[0].source.as_deref(), Some("notes.md"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_session_status() {
        let thinking: StreamEvent =
            serde_json::from_str(r#"{"type":"session.status","status":"thinking"}"#).unwrap();
        let done: StreamEvent =
            serde_json::from_str(r#"{"type":"session.status","status":"done"}"#).unwrap();

        assert!(matches!(
            thinking,
            StreamEvent::SessionStatus { status: StreamStatus::Thinking, .. }
        ));
        assert!(matches!(
            done,
            StreamEvent::SessionStatus { status: StreamStatus::Done, .. }
        ));
    }

    #[test]
    fn test_parse_unknown_type_fails() {
        let result = serde_json::from_str::<StreamEvent>(r#"{"type":"mystery","x":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_stream_request_shape() {
        let req = StreamRequest {
            text: "hello".to_string(),
            files: vec!["f1".to_string()],
            session_id: "s1".to_string(),
            assistant_id: "a1".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["text"], "hello");
        assert_eq!(json["files"][0], "f1");
        assert_eq!(json["session_id"], "s1");
        assert_eq!(json["assistant_id"], "a1");
    }
}
