//! Session metadata and turn lifecycle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse user-visible status of the active turn.
///
/// This is the only error surface the presentation layer sees; transport and
/// parse failures never propagate past the controller boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// No turn in flight; input accepted.
    #[default]
    Ready,
    /// A streaming turn is in progress.
    Generating,
    /// The stream failed at the transport level.
    ConnectionFailed,
}

/// A persisted conversation, as listed by the sessions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of persisted messages.
    #[serde(default)]
    pub message_count: u64,
}

/// Final outcome of one streaming turn, handed to the post-turn hook.
///
/// Session-metadata refresh and memory/summary checks hang off this instead
/// of living inline in the event switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub session_id: String,
    pub status: TurnStatus,
    /// Assistant message the turn produced, if any text arrived.
    pub assistant_message_id: Option<String>,
    /// Whether the turn ended via local cancellation.
    pub cancelled: bool,
}
