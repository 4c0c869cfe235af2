//! Shared types for the Carrel notebook-assistant client.

mod event;
mod history;
mod message;
mod podcast;
mod session;

pub use event::*;
pub use history::*;
pub use message::*;
pub use podcast::*;
pub use session::*;
