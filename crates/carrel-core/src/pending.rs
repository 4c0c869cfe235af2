//! Pending-binding buffer for document artifacts.
//!
//! A `tool.end` frame can report a generated document before the assistant
//! message it belongs to has been created (out-of-order delivery of tool
//! completion relative to the first text delta of the same turn). Records are
//! queued here per target message id and drained all-or-nothing the instant
//! that message is inserted into the transcript.

use carrel_types::WriteArtifact;
use std::collections::HashMap;

/// Write artifacts waiting for their assistant message to exist.
#[derive(Debug, Default)]
pub struct PendingWrites {
    by_message: HashMap<String, Vec<WriteArtifact>>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write record for a message id not yet in the transcript.
    /// Multiple enqueues for the same id accumulate in arrival order.
    pub fn enqueue(&mut self, target_message_id: impl Into<String>, write: WriteArtifact) {
        self.by_message
            .entry(target_message_id.into())
            .or_default()
            .push(write);
    }

    /// Remove and return all records queued for the given message id.
    ///
    /// Called exactly once, at the moment the transcript creates the
    /// assistant message with that id. An id that was never created leaves
    /// its entries unreachable until the session is discarded, which is
    /// acceptable since the buffer is torn down with the session.
    pub fn drain(&mut self, target_message_id: &str) -> Vec<WriteArtifact> {
        self.by_message.remove(target_message_id).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_message.is_empty()
    }

    /// Number of message ids with queued records.
    pub fn len(&self) -> usize {
        self.by_message.len()
    }

    /// Discard everything. Used when the session itself is discarded.
    pub fn clear(&mut self) {
        self.by_message.clear();
    }
}
