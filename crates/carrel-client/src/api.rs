//! HTTP API client.
//!
//! Thin typed wrapper over the notebook API. The streaming chat endpoint
//! hands back the raw byte stream for the controller to decode; everything
//! else is plain request/response.

use crate::config::ClientConfig;
use bytes::Bytes;
use carrel_types::{PodcastRequest, PodcastTask, SessionHistory, SessionSummary, StreamRequest};
use futures::Stream;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum response-body excerpt carried in error messages.
const MAX_BODY_EXCERPT: usize = 600;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}: {1}")]
    UnexpectedStatus(StatusCode, String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// User feedback on an assistant message.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Like,
    Dislike,
    Copied,
}

/// Typed client for the notebook API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        // Only the connect phase is bounded; the stream body has no timeout.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Open a streaming chat turn, returning the raw byte stream.
    pub async fn open_stream(
        &self,
        request: &StreamRequest,
    ) -> Result<impl Stream<Item = reqwest::Result<Bytes>>> {
        let resp = self
            .http
            .post(self.url("/api/chat/stream"))
            .header(reqwest::header::ACCEPT, "application/x-ndjson")
            .json(request)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        debug!(target: "carrel::http", "stream opened for session {}", request.session_id);
        Ok(resp.bytes_stream())
    }

    /// Ask the server to stop generation for a session.
    ///
    /// Advisory: callers treat cancellation as successful once the local
    /// abort succeeds and swallow failures from this call.
    pub async fn stop_generation(&self, session_id: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.url(&format!("/api/chat/{}/stop", session_id)))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Fetch the persisted history for a session.
    pub async fn fetch_history(&self, session_id: &str) -> Result<SessionHistory> {
        let resp = self
            .http
            .get(self.url(&format!("/api/sessions/{}/history", session_id)))
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// List persisted sessions.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let resp = self.http.get(self.url("/api/sessions")).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Delete a session and its transcript server-side.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/sessions/{}", session_id)))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Report user feedback on a message. Callers fire and forget.
    pub async fn send_feedback(&self, message_id: &str, kind: FeedbackKind) -> Result<()> {
        let resp = self
            .http
            .post(self.url("/api/feedback"))
            .json(&serde_json::json!({ "message_id": message_id, "kind": kind }))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Submit a podcast generation job.
    pub async fn create_podcast(&self, request: &PodcastRequest) -> Result<PodcastTask> {
        let resp = self
            .http
            .post(self.url("/api/podcasts"))
            .json(request)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Poll the status of a podcast generation job.
    pub async fn podcast_status(&self, task_id: &str) -> Result<PodcastTask> {
        let resp = self
            .http
            .get(self.url(&format!("/api/podcasts/{}", task_id)))
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }
}

/// Turn a non-success response into an error carrying a body excerpt, so
/// callers and logs see the server's actual message instead of an opaque
/// status line.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let mut body = resp.text().await.unwrap_or_default();
    truncate_excerpt(&mut body);
    warn!(target: "carrel::http", "request failed with {}: {}", status, body);
    Err(ClientError::UnexpectedStatus(status, body))
}

/// Cap the body excerpt, cutting at a char boundary so a multi-byte
/// character straddling the limit cannot panic the truncation.
fn truncate_excerpt(body: &mut String) {
    if body.len() <= MAX_BODY_EXCERPT {
        return;
    }
    let mut cut = MAX_BODY_EXCERPT;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    body.truncate(cut);
}
