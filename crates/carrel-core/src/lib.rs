//! Streaming chat session core for the Carrel notebook-assistant client.

mod ids;
mod interpreter;
mod pending;
mod replay;
mod task;
mod transcript;
mod turn;
mod writes;

pub use ids::{new_client_id, new_message_id, SessionIdStore};
pub use interpreter::{apply_event, EventOutcome};
pub use pending::PendingWrites;
pub use replay::build_transcript;
pub use task::{TaskWatcher, WatchResult};
pub use transcript::{AssistantPatch, ToolPatch, Transcript};
pub use turn::TurnState;
pub use writes::{embedded_write_id, extract_write};
