//! Transcript store.
//!
//! The authoritative ordered sequence of messages for the active session.
//! Only the stream event interpreter mutates it, from the single-threaded
//! event-processing path; presentation reads a snapshot.
//!
//! Invariants preserved by every operation:
//! - Exactly one tool entry per distinct tool-call id; later events with the
//!   same id update in place.
//! - Assistant content is append-only within a streaming turn.
//! - A write artifact is bound to at most one assistant message, and
//!   rebinding the same write id replaces rather than duplicates.

use crate::pending::PendingWrites;
use carrel_types::{
    AssistantMessage, Message, Reference, ToolMessage, ToolStatus, WriteArtifact,
};
use serde_json::Value;
use tracing::debug;

/// Partial update for a tool entry, applied by [`Transcript::upsert_tool`].
#[derive(Debug, Default)]
pub struct ToolPatch {
    pub status: Option<ToolStatus>,
    pub output: Option<Value>,
    /// Invocation args; only used when the patch creates the entry.
    pub args: Option<Value>,
}

/// Partial update for an assistant entry, applied by
/// [`Transcript::patch_assistant`].
#[derive(Debug, Default)]
pub struct AssistantPatch {
    pub references: Option<Vec<Reference>>,
    pub suggested_questions: Option<Vec<String>>,
}

/// Ordered collection of messages for one session.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Borrow the ordered messages.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Clone the current state for rendering.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Add a message at the end.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Full replacement. Used only when loading history for a session.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Insert a tool entry preserving "tools ran, then assistant replied"
    /// ordering: scan backward from the end; insert immediately before the
    /// most recent assistant message if only tool entries follow it, or
    /// append at the end if a user message is found first (no assistant
    /// reply yet to precede).
    pub fn insert_before_last_assistant(&mut self, message: Message) {
        for i in (0..self.messages.len()).rev() {
            match &self.messages[i] {
                Message::Assistant(_) => {
                    self.messages.insert(i, message);
                    return;
                }
                Message::User(_) => break,
                Message::Tool(_) => continue,
            }
        }
        self.messages.push(message);
    }

    /// Find-or-create a tool entry by tool-call id and merge the patch.
    ///
    /// An existing entry is updated in place, never duplicated. A terminal
    /// status in the patch also sets the end timestamp.
    pub fn upsert_tool(&mut self, tool_call_id: &str, tool_name: &str, patch: ToolPatch) {
        if let Some(tool) = self.find_tool_mut(tool_call_id) {
            if let Some(status) = patch.status {
                match status {
                    ToolStatus::Running => tool.status = status,
                    _ => tool.complete(status, patch.output.unwrap_or(Value::Null)),
                }
            } else if let Some(output) = patch.output {
                tool.output = Some(output);
            }
            return;
        }

        let mut tool =
            ToolMessage::running(tool_call_id, tool_name, patch.args.unwrap_or(Value::Null));
        if let Some(status) = patch.status {
            if status != ToolStatus::Running {
                // tool.end arrived without a preceding tool.start
                tool.complete(status, patch.output.unwrap_or(Value::Null));
            }
        }
        debug!(target: "carrel::transcript", "inserting tool entry {}", tool_call_id);
        self.insert_before_last_assistant(Message::Tool(tool));
    }

    /// Append a streamed text chunk to the assistant message with the given
    /// id, creating it first if it does not exist yet.
    ///
    /// Creation drains any queued pending writes for the id into the new
    /// message. Returns `true` when the message was created by this call.
    pub fn append_assistant_delta(
        &mut self,
        id: &str,
        chunk: &str,
        pending: &mut PendingWrites,
    ) -> bool {
        if let Some(assistant) = self.find_assistant_mut(id) {
            assistant.append_content(chunk);
            return false;
        }

        let mut assistant = AssistantMessage::new(id);
        for write in pending.drain(id) {
            assistant.bind_write(write);
        }
        assistant.append_content(chunk);
        self.messages.push(Message::Assistant(assistant));
        true
    }

    /// Merge side-channel fields into an existing assistant entry.
    /// No-op if the entry does not exist; callers buffer instead.
    pub fn patch_assistant(&mut self, id: &str, patch: AssistantPatch) -> bool {
        let Some(assistant) = self.find_assistant_mut(id) else {
            return false;
        };
        if let Some(references) = patch.references {
            assistant.references = references;
        }
        if let Some(questions) = patch.suggested_questions {
            assistant.suggested_questions = questions;
        }
        true
    }

    /// Bind a write artifact to the assistant message with the given id.
    /// Returns `false` when no such message exists.
    pub fn bind_write(&mut self, message_id: &str, write: WriteArtifact) -> bool {
        match self.find_assistant_mut(message_id) {
            Some(assistant) => {
                assistant.bind_write(write);
                true
            }
            None => false,
        }
    }

    /// Bind a write artifact to the most recent assistant message.
    ///
    /// Best-effort fallback for document events that name no target id.
    pub fn bind_write_to_last_assistant(&mut self, write: WriteArtifact) -> bool {
        for message in self.messages.iter_mut().rev() {
            if let Message::Assistant(assistant) = message {
                assistant.bind_write(write);
                return true;
            }
        }
        false
    }

    /// Whether an assistant message with the given id exists.
    pub fn has_assistant(&self, id: &str) -> bool {
        self.messages
            .iter()
            .any(|m| matches!(m, Message::Assistant(a) if a.id == id))
    }

    pub fn find_assistant(&self, id: &str) -> Option<&AssistantMessage> {
        self.messages.iter().find_map(|m| match m {
            Message::Assistant(a) if a.id == id => Some(a),
            _ => None,
        })
    }

    fn find_assistant_mut(&mut self, id: &str) -> Option<&mut AssistantMessage> {
        self.messages.iter_mut().find_map(|m| match m {
            Message::Assistant(a) if a.id == id => Some(a),
            _ => None,
        })
    }

    pub fn find_tool(&self, id: &str) -> Option<&ToolMessage> {
        self.messages.iter().find_map(|m| match m {
            Message::Tool(t) if t.id == id => Some(t),
            _ => None,
        })
    }

    fn find_tool_mut(&mut self, id: &str) -> Option<&mut ToolMessage> {
        self.messages.iter_mut().find_map(|m| match m {
            Message::Tool(t) if t.id == id => Some(t),
            _ => None,
        })
    }

    /// Id of the most recent assistant message, if any.
    pub fn last_assistant_id(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant(a) => Some(a.id.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrel_types::UserMessage;
    use proptest::prelude::*;

    fn user(content: &str) -> Message {
        Message::User(UserMessage::new(content, Vec::new()))
    }

    fn assistant(id: &str, content: &str) -> Message {
        let mut a = AssistantMessage::new(id);
        a.append_content(content);
        Message::Assistant(a)
    }

    fn write(id: &str) -> WriteArtifact {
        WriteArtifact {
            write_id: id.to_string(),
            title: String::new(),
            kind: None,
            size: None,
        }
    }

    // ==================== Ordering Tests ====================

    #[test]
    fn test_tool_inserted_before_last_assistant() {
        let mut t = Transcript::new();
        t.append(user("hi"));
        t.append(assistant("m1", "hello"));

        t.upsert_tool("t1", "search", ToolPatch::default());

        let roles: Vec<&str> = t
            .messages()
            .iter()
            .map(|m| match m {
                Message::User(_) => "user",
                Message::Assistant(_) => "assistant",
                Message::Tool(_) => "tool",
            })
            .collect();
        assert_eq!(roles, vec!["user", "tool", "assistant"]);
    }

    #[test]
    fn test_tool_appended_when_user_is_last() {
        // Transcript ends in a user message: a new tool call belongs to the
        // upcoming reply, not a stale prior assistant message.
        let mut t = Transcript::new();
        t.append(user("first"));
        t.append(assistant("m1", "old reply"));
        t.append(user("second"));

        t.upsert_tool("t1", "search", ToolPatch::default());

        assert_eq!(t.len(), 4);
        assert!(matches!(t.messages()[3], Message::Tool(_)));
    }

    #[test]
    fn test_tool_run_stays_contiguous() {
        let mut t = Transcript::new();
        t.append(user("hi"));
        t.append(assistant("m1", "reply"));

        t.upsert_tool("t1", "search", ToolPatch::default());
        t.upsert_tool("t2", "search", ToolPatch::default());

        let ids: Vec<&str> = t.messages().iter().map(|m| m.id()).collect();
        assert_eq!(&ids[1..], &["t1", "t2", "m1"]);
    }

    #[test]
    fn test_tool_appended_on_empty_transcript() {
        let mut t = Transcript::new();
        t.upsert_tool("t1", "search", ToolPatch::default());
        assert_eq!(t.len(), 1);
    }

    // ==================== Tool Upsert Tests ====================

    #[test]
    fn test_upsert_tool_never_duplicates() {
        let mut t = Transcript::new();
        t.upsert_tool(
            "t1",
            "search",
            ToolPatch { args: Some(serde_json::json!({"q": "a"})), ..Default::default() },
        );
        t.upsert_tool(
            "t1",
            "search",
            ToolPatch {
                status: Some(ToolStatus::Done),
                output: Some(serde_json::json!("ok")),
                ..Default::default()
            },
        );

        assert_eq!(t.len(), 1);
        let tool = t.find_tool("t1").unwrap();
        assert_eq!(tool.status, ToolStatus::Done);
        assert_eq!(tool.output, Some(serde_json::json!("ok")));
        assert!(tool.ended_at.is_some());
        // Args from the original start are preserved.
        assert_eq!(tool.args["q"], "a");
    }

    #[test]
    fn test_upsert_tool_end_without_start() {
        let mut t = Transcript::new();
        t.upsert_tool(
            "t1",
            "search",
            ToolPatch {
                status: Some(ToolStatus::Error),
                output: Some(serde_json::json!("boom")),
                ..Default::default()
            },
        );

        let tool = t.find_tool("t1").unwrap();
        assert_eq!(tool.status, ToolStatus::Error);
        assert!(tool.ended_at.is_some());
    }

    #[test]
    fn test_upsert_tool_last_end_wins() {
        let mut t = Transcript::new();
        t.upsert_tool("t1", "search", ToolPatch::default());
        t.upsert_tool(
            "t1",
            "search",
            ToolPatch {
                status: Some(ToolStatus::Done),
                output: Some(serde_json::json!("first")),
                ..Default::default()
            },
        );
        t.upsert_tool(
            "t1",
            "search",
            ToolPatch {
                status: Some(ToolStatus::Error),
                output: Some(serde_json::json!("second")),
                ..Default::default()
            },
        );

        assert_eq!(t.len(), 1);
        let tool = t.find_tool("t1").unwrap();
        assert_eq!(tool.status, ToolStatus::Error);
        assert_eq!(tool.output, Some(serde_json::json!("second")));
    }

    // ==================== Assistant Delta Tests ====================

    #[test]
    fn test_append_delta_creates_then_appends() {
        let mut t = Transcript::new();
        let mut pending = PendingWrites::new();

        assert!(t.append_assistant_delta("m1", "Hi", &mut pending));
        assert!(!t.append_assistant_delta("m1", " there", &mut pending));

        assert_eq!(t.find_assistant("m1").unwrap().content, "Hi there");
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_append_delta_drains_pending_writes_at_creation() {
        let mut t = Transcript::new();
        let mut pending = PendingWrites::new();
        pending.enqueue("m1", write("w1"));
        pending.enqueue("m1", write("w2"));

        t.append_assistant_delta("m1", "Hi", &mut pending);

        let assistant = t.find_assistant("m1").unwrap();
        assert_eq!(assistant.writes.len(), 2);
        assert!(pending.is_empty());

        // Later deltas must not re-drain or duplicate.
        t.append_assistant_delta("m1", "!", &mut pending);
        assert_eq!(t.find_assistant("m1").unwrap().writes.len(), 2);
    }

    #[test]
    fn test_patch_assistant_missing_is_noop() {
        let mut t = Transcript::new();
        let patched = t.patch_assistant(
            "ghost",
            AssistantPatch { references: Some(Vec::new()), ..Default::default() },
        );
        assert!(!patched);
        assert!(t.is_empty());
    }

    #[test]
    fn test_patch_assistant_merges_fields() {
        let mut t = Transcript::new();
        t.append(assistant("m1", "text"));

        t.patch_assistant(
            "m1",
            AssistantPatch {
                references: Some(vec![Reference {
                    index: 1,
                    source: Some("notes.md".to_string()),
                    source_id: None,
                    text: None,
                }]),
                suggested_questions: None,
            },
        );
        t.patch_assistant(
            "m1",
            AssistantPatch {
                references: None,
                suggested_questions: Some(vec!["What next?".to_string()]),
            },
        );

        let a = t.find_assistant("m1").unwrap();
        assert_eq!(a.references.len(), 1);
        assert_eq!(a.suggested_questions, vec!["What next?".to_string()]);
        assert_eq!(a.content, "text");
    }

    // ==================== Write Binding Tests ====================

    #[test]
    fn test_bind_write_to_missing_message() {
        let mut t = Transcript::new();
        assert!(!t.bind_write("ghost", write("w1")));
    }

    #[test]
    fn test_bind_write_to_last_assistant_fallback() {
        let mut t = Transcript::new();
        t.append(assistant("m1", "old"));
        t.append(user("more"));
        t.append(assistant("m2", "new"));

        assert!(t.bind_write_to_last_assistant(write("w1")));
        assert!(t.find_assistant("m1").unwrap().writes.is_empty());
        assert_eq!(t.find_assistant("m2").unwrap().writes.len(), 1);
    }

    #[test]
    fn test_bind_write_to_last_assistant_empty_transcript() {
        let mut t = Transcript::new();
        assert!(!t.bind_write_to_last_assistant(write("w1")));
    }

    // ==================== Replace Tests ====================

    #[test]
    fn test_replace_all_discards_previous() {
        let mut t = Transcript::new();
        t.append(user("old"));

        t.replace_all(vec![user("a"), assistant("m1", "b")]);

        assert_eq!(t.len(), 2);
        assert!(t.has_assistant("m1"));
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_assistant_content_is_concatenation(chunks in proptest::collection::vec(".{0,12}", 1..20)) {
            let mut t = Transcript::new();
            let mut pending = PendingWrites::new();
            let mut expected = String::new();

            for chunk in &chunks {
                let before = t
                    .find_assistant("m1")
                    .map(|a| a.content.len())
                    .unwrap_or(0);
                t.append_assistant_delta("m1", chunk, &mut pending);
                let after = t.find_assistant("m1").unwrap().content.len();
                // Content never shrinks at any intermediate point.
                prop_assert!(after >= before);
                expected.push_str(chunk);
            }

            prop_assert_eq!(&t.find_assistant("m1").unwrap().content, &expected);
            prop_assert_eq!(t.len(), 1);
        }
    }
}
