//! Per-turn streaming state.

use carrel_types::{Reference, TurnOutcome, TurnStatus};

/// Ephemeral state for one streaming turn.
///
/// Owned by the stream session controller and passed into the interpreter on
/// every event, so the interpreter stays a plain function over explicit state
/// rather than a web of captured mutable cells. Lives from message send until
/// `session.status=done` or cancellation; reset at both boundaries and on
/// session switch.
#[derive(Debug)]
pub struct TurnState {
    /// Id of the session this turn belongs to. Events tagged with any other
    /// session id are discarded without side effects.
    pub session_id: String,
    /// Server-assigned message id to use for the next delta, superseding any
    /// client-generated placeholder.
    pub pending_assistant_id: Option<String>,
    /// Assistant message opened by this turn's deltas, once one exists.
    pub open_assistant_id: Option<String>,
    /// References that arrived before the assistant message opened.
    pub pending_references: Option<Vec<Reference>>,
    /// Coarse user-visible status.
    pub status: TurnStatus,
}

impl TurnState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            pending_assistant_id: None,
            open_assistant_id: None,
            pending_references: None,
            status: TurnStatus::Ready,
        }
    }

    /// Clear all per-turn pending state, keeping the session binding.
    pub fn reset(&mut self) {
        self.pending_assistant_id = None;
        self.open_assistant_id = None;
        self.pending_references = None;
        self.status = TurnStatus::Ready;
    }

    /// Snapshot the turn's final outcome for the post-turn hook.
    pub fn outcome(&self, cancelled: bool) -> TurnOutcome {
        TurnOutcome {
            session_id: self.session_id.clone(),
            status: self.status,
            assistant_message_id: self.open_assistant_id.clone(),
            cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_keeps_session_binding() {
        let mut turn = TurnState::new("s1");
        turn.pending_assistant_id = Some("m1".to_string());
        turn.open_assistant_id = Some("m1".to_string());
        turn.pending_references = Some(Vec::new());
        turn.status = TurnStatus::Generating;

        turn.reset();

        assert_eq!(turn.session_id, "s1");
        assert!(turn.pending_assistant_id.is_none());
        assert!(turn.open_assistant_id.is_none());
        assert!(turn.pending_references.is_none());
        assert_eq!(turn.status, TurnStatus::Ready);
    }

    #[test]
    fn test_outcome_snapshot() {
        let mut turn = TurnState::new("s1");
        turn.open_assistant_id = Some("m1".to_string());
        turn.status = TurnStatus::Generating;

        let outcome = turn.outcome(true);
        assert_eq!(outcome.session_id, "s1");
        assert_eq!(outcome.assistant_message_id.as_deref(), Some("m1"));
        assert!(outcome.cancelled);
    }
}
