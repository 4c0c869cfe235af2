//! Podcast generation task types.
//!
//! Podcast synthesis runs as a one-shot background job on the server; the
//! client only submits the request and polls the task status with a bounded
//! retry count. This is deliberately separate from the chat streaming core.

use serde::{Deserialize, Serialize};

/// Server-side state of a podcast generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PodcastTaskState {
    /// Queued, not yet picked up.
    Pending,
    /// Synthesis in progress.
    Started,
    /// Audio is ready.
    Success,
    /// Synthesis failed.
    Failure,
    /// Task was cancelled server-side.
    Cancelled,
}

impl PodcastTaskState {
    /// Whether the task has reached a state it will never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PodcastTaskState::Success | PodcastTaskState::Failure | PodcastTaskState::Cancelled
        )
    }
}

/// Status snapshot of a podcast task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastTask {
    pub task_id: String,
    pub state: PodcastTaskState,
    /// Download URL, present once the task succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request body for generating a podcast episode from session sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastRequest {
    pub session_id: String,
    /// Source/file ids to synthesize from.
    #[serde(default)]
    pub source_ids: Vec<String>,
    /// Optional episode focus prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
}
