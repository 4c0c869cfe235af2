//! Identifier and session persistence utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Generate a fresh client-side message id.
pub fn new_message_id() -> String {
    format!("msg-{}", uuid::Uuid::new_v4())
}

/// Generate a stable client instance id.
pub fn new_client_id() -> String {
    format!("client-{}", uuid::Uuid::new_v4())
}

/// File-backed persistence of the active session id, so a restarted client
/// reopens the session it was last viewing.
#[derive(Debug, Clone)]
pub struct SessionIdStore {
    path: PathBuf,
}

impl SessionIdStore {
    /// Store backed by the platform data directory.
    pub fn new() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self { path: base.join("carrel").join("active_session") }
    }

    /// Store backed by an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The persisted session id, if one was saved.
    pub fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let id = contents.trim().to_string();
                if id.is_empty() { None } else { Some(id) }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                debug!(target: "carrel::session", "failed to read session id file: {}", e);
                None
            }
        }
    }

    /// Persist the active session id.
    pub fn save(&self, session_id: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, session_id)
    }

    /// Forget the persisted session id (e.g. after the session is deleted).
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for SessionIdStore {
    fn default() -> Self {
        Self::new()
    }
}
