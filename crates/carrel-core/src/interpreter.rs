//! Stream event interpreter.
//!
//! Maps one decoded server event onto transcript/buffer mutations. All state
//! is passed in explicitly (the per-turn record, the transcript, the pending
//! write buffer), so every decision here is testable by driving this function
//! directly with owned values.
//!
//! Events are processed strictly in arrival order; tolerance for out-of-order
//! delivery comes from the buffering strategies (pending assistant id, early
//! reference buffering, the pending-write index), not from sorting.

use crate::pending::PendingWrites;
use crate::transcript::{AssistantPatch, ToolPatch, Transcript};
use crate::turn::TurnState;
use crate::writes::extract_write;
use carrel_types::{StreamEvent, StreamStatus, ToolStatus, TurnStatus};
use serde_json::Value;
use tracing::{debug, warn};

/// What applying one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// State was mutated (or the event was a valid no-op).
    Applied,
    /// The event belonged to a foreign session and was discarded.
    Ignored,
    /// The turn finished; per-turn state has been cleared and the post-turn
    /// hook should fire.
    TurnDone,
}

/// Apply one decoded event to the session state.
pub fn apply_event(
    event: StreamEvent,
    turn: &mut TurnState,
    transcript: &mut Transcript,
    pending: &mut PendingWrites,
) -> EventOutcome {
    // Session guard: a late event from an aborted or switched-away stream
    // must produce zero mutations.
    if let Some(sid) = event.session_id() {
        if sid != turn.session_id {
            debug!(
                target: "carrel::stream",
                "discarding event for session {} while {} is active", sid, turn.session_id
            );
            return EventOutcome::Ignored;
        }
    }

    match event {
        StreamEvent::MessageStart { message_id, .. } => {
            // Supersedes any client-generated placeholder for the next delta.
            turn.pending_assistant_id = Some(message_id);
            EventOutcome::Applied
        }

        StreamEvent::Delta { text, .. } => {
            let id = match &turn.open_assistant_id {
                Some(id) => id.clone(),
                None => turn
                    .pending_assistant_id
                    .take()
                    .unwrap_or_else(|| format!("assistant-{}", uuid::Uuid::new_v4())),
            };
            let created = transcript.append_assistant_delta(&id, &text, pending);
            if created {
                if let Some(references) = turn.pending_references.take() {
                    transcript.patch_assistant(
                        &id,
                        AssistantPatch { references: Some(references), ..Default::default() },
                    );
                }
            }
            turn.open_assistant_id = Some(id);
            EventOutcome::Applied
        }

        StreamEvent::References { references, .. } => {
            match &turn.open_assistant_id {
                Some(id) => {
                    transcript.patch_assistant(
                        id,
                        AssistantPatch { references: Some(references), ..Default::default() },
                    );
                }
                None => {
                    // Applied the moment the assistant message opens.
                    turn.pending_references = Some(references);
                }
            }
            EventOutcome::Applied
        }

        StreamEvent::SuggestedQuestions { questions, .. } => {
            match &turn.open_assistant_id {
                Some(id) => {
                    transcript.patch_assistant(
                        id,
                        AssistantPatch {
                            suggested_questions: Some(questions),
                            ..Default::default()
                        },
                    );
                }
                None => {
                    debug!(
                        target: "carrel::stream",
                        "dropping suggested questions with no open assistant message"
                    );
                }
            }
            EventOutcome::Applied
        }

        StreamEvent::ToolStart { id, name, args, .. } => {
            transcript.upsert_tool(
                &id,
                &name,
                ToolPatch { args: Some(args), ..Default::default() },
            );
            EventOutcome::Applied
        }

        StreamEvent::ToolEnd { id, name, status, output, message_id, .. } => {
            let tool_status = if status == "error" { ToolStatus::Error } else { ToolStatus::Done };
            transcript.upsert_tool(
                &id,
                &name,
                ToolPatch {
                    status: Some(tool_status),
                    output: Some(output.clone()),
                    ..Default::default()
                },
            );

            if tool_status != ToolStatus::Error {
                if let Some(write) = extract_write(&output) {
                    bind_or_enqueue_write(write, message_id, turn, transcript, pending);
                }
            }
            EventOutcome::Applied
        }

        StreamEvent::SessionStatus { status: StreamStatus::Thinking, .. } => {
            turn.status = TurnStatus::Generating;
            EventOutcome::Applied
        }

        StreamEvent::SessionStatus { status: StreamStatus::Done, .. } => {
            // Clear per-turn pending state but keep the produced message id
            // so the post-turn hook can report it.
            let open = turn.open_assistant_id.take();
            turn.reset();
            turn.open_assistant_id = open;
            EventOutcome::TurnDone
        }

        StreamEvent::Error { message, .. } => {
            // Surface the failure in-transcript as a failed tool-like entry
            // so the user sees something went wrong without losing the rest
            // of the conversation.
            let id = format!("error-{}", uuid::Uuid::new_v4());
            transcript.upsert_tool(
                &id,
                "Error",
                ToolPatch {
                    status: Some(ToolStatus::Error),
                    output: Some(Value::String(message)),
                    ..Default::default()
                },
            );
            EventOutcome::Applied
        }
    }
}

/// Route a generated-document record to the assistant message it belongs to.
///
/// Target resolution order: explicit `message_id` on the event, then the
/// turn's open or pending assistant id. A known target that does not exist
/// yet is queued in the pending-write index and never dropped; an unknown
/// target falls back to the last assistant message, best effort.
fn bind_or_enqueue_write(
    write: carrel_types::WriteArtifact,
    event_message_id: Option<String>,
    turn: &TurnState,
    transcript: &mut Transcript,
    pending: &mut PendingWrites,
) {
    let target = event_message_id
        .or_else(|| turn.open_assistant_id.clone())
        .or_else(|| turn.pending_assistant_id.clone());

    match target {
        Some(message_id) => {
            if !transcript.bind_write(&message_id, write.clone()) {
                debug!(
                    target: "carrel::stream",
                    "queueing write {} for message {} not yet in transcript",
                    write.write_id, message_id
                );
                pending.enqueue(message_id, write);
            }
        }
        None => {
            if !transcript.bind_write_to_last_assistant(write.clone()) {
                warn!(
                    target: "carrel::stream",
                    "write {} has no resolvable target message; dropping", write.write_id
                );
            }
        }
    }
}
