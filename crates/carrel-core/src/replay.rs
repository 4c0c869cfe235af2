//! History replay.
//!
//! Rebuilds the transcript for a session from the history endpoint payload.
//! The result must match what live streaming would have produced, including
//! document bindings: a persisted document names its assistant message
//! directly, or is traced through the tool call that produced it, or lands on
//! the last assistant message as a final best effort.

use crate::transcript::Transcript;
use crate::writes::embedded_write_id;
use carrel_types::{
    AssistantMessage, HistoryDocument, HistoryMessage, HistoryRole, Message, SessionHistory,
    ToolMessage, ToolStatus, UserMessage, WriteArtifact,
};
use tracing::debug;

/// Reconstruct a transcript from persisted history.
pub fn build_transcript(history: SessionHistory) -> Transcript {
    let mut messages: Vec<Message> = history.messages.iter().map(restore_message).collect();

    for doc in &history.documents {
        bind_document(&mut messages, doc);
    }

    let mut transcript = Transcript::new();
    transcript.replace_all(messages);
    transcript
}

fn restore_message(msg: &HistoryMessage) -> Message {
    match msg.role {
        HistoryRole::User => Message::User(UserMessage {
            id: msg.id.clone(),
            content: msg.content.clone(),
            attachments: msg.attachments.clone(),
            timestamp: msg.timestamp,
        }),
        HistoryRole::Assistant => Message::Assistant(AssistantMessage {
            id: msg.id.clone(),
            content: msg.content.clone(),
            references: msg.references.clone(),
            suggested_questions: msg.suggested_questions.clone(),
            writes: Vec::new(),
            is_pending: false,
            timestamp: msg.timestamp,
        }),
        HistoryRole::Tool => Message::Tool(ToolMessage {
            id: msg.id.clone(),
            tool_name: msg.tool_name.clone().unwrap_or_else(|| "tool".to_string()),
            status: match msg.status.as_deref() {
                Some("error") => ToolStatus::Error,
                _ => ToolStatus::Done,
            },
            args: msg.args.clone(),
            output: msg.output.clone(),
            started_at: msg.timestamp,
            ended_at: Some(msg.timestamp),
        }),
    }
}

fn bind_document(messages: &mut [Message], doc: &HistoryDocument) {
    let write = WriteArtifact {
        write_id: doc.write_id.clone(),
        title: doc.title.clone(),
        kind: doc.kind.clone(),
        size: doc.size,
    };

    // Preferred: the document names its assistant message.
    if let Some(message_id) = &doc.message_id {
        if bind_to_assistant(messages, message_id, write.clone()) {
            return;
        }
    }

    // Backward compat: trace through the producing tool call. Older servers
    // persisted no message_id, so the tool's raw output is inspected for the
    // embedded identifier and the document attaches to the assistant reply
    // that followed the tool run.
    if let Some(idx) = producing_tool_index(messages, doc) {
        if let Some(assistant) = messages[idx..].iter_mut().find_map(|m| m.as_assistant_mut()) {
            assistant.bind_write(write);
            return;
        }
    }

    // Best effort: last assistant message.
    if let Some(assistant) = messages.iter_mut().rev().find_map(|m| m.as_assistant_mut()) {
        debug!(
            target: "carrel::replay",
            "binding document {} to last assistant message as fallback", doc.write_id
        );
        assistant.bind_write(write);
    }
}

fn bind_to_assistant(messages: &mut [Message], message_id: &str, write: WriteArtifact) -> bool {
    for message in messages.iter_mut() {
        if let Message::Assistant(assistant) = message {
            if assistant.id == message_id {
                assistant.bind_write(write);
                return true;
            }
        }
    }
    false
}

/// Index of the tool message that produced the document, if it can be found.
fn producing_tool_index(messages: &[Message], doc: &HistoryDocument) -> Option<usize> {
    messages.iter().position(|m| match m {
        Message::Tool(tool) => {
            let id_matches = doc
                .tool_call_id
                .as_deref()
                .is_some_and(|id| id == tool.id);
            let output_matches = tool
                .output
                .as_ref()
                .and_then(embedded_write_id)
                .is_some_and(|id| id == doc.write_id);
            id_matches || output_matches
        }
        _ => false,
    })
}
