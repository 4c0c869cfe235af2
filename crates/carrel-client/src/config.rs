//! Client configuration.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the notebook API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Assistant to address chat turns to.
    #[serde(default = "default_assistant_id")]
    pub assistant_id: String,
    /// Connect timeout for API requests, seconds. No timeout is enforced on
    /// the stream body itself.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// File holding the persisted active-session id.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_assistant_id() -> String {
    "default".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_session_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("carrel")
        .join("active_session")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            assistant_id: default_assistant_id(),
            connect_timeout_secs: default_connect_timeout_secs(),
            session_file: default_session_file(),
        }
    }
}

impl ClientConfig {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from the default location (config/carrel.toml) or fall
    /// back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/carrel.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }
        Ok(ClientConfig::default())
    }
}
