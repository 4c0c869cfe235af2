//! Stream session controller.
//!
//! Owns the session state (transcript, per-turn state, pending write bindings)
//! and drives one streaming turn at a time:
//! - `send` appends the user message synchronously, then spawns a task that
//!   reads the response stream and feeds each frame to the interpreter
//! - at most one stream task is live; sending or switching sessions aborts
//!   the previous one first
//! - cancellation is idempotent: the task handle is taken out of its slot, so
//!   a second cancel finds nothing to abort
//! - an optional post-turn hook observes every turn boundary (done, cancelled,
//!   connection failure, stream cut short)

use crate::api::{ApiClient, FeedbackKind};
use crate::frame::FrameDecoder;
use carrel_core::{
    apply_event, build_transcript, EventOutcome, PendingWrites, SessionIdStore, TaskWatcher,
    Transcript, TurnState, WatchResult,
};
use carrel_types::{
    Message, PodcastRequest, StreamEvent, StreamRequest, TurnOutcome, TurnStatus, UserMessage,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Callback fired at every turn boundary.
pub type TurnHook = Arc<dyn Fn(TurnOutcome) + Send + Sync>;

/// Everything the interpreter mutates, behind one lock so a frame is applied
/// atomically with respect to snapshots.
struct SessionState {
    transcript: Transcript,
    pending: PendingWrites,
    turn: TurnState,
}

impl SessionState {
    fn new(session_id: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::new(),
            pending: PendingWrites::new(),
            turn: TurnState::new(session_id),
        }
    }
}

pub struct ChatController {
    api: ApiClient,
    state: Arc<RwLock<SessionState>>,
    /// Handle of the live stream task, if any. Taken (not just aborted) on
    /// cancel so repeated cancels are no-ops.
    active: Arc<Mutex<Option<JoinHandle<()>>>>,
    session_ids: SessionIdStore,
    on_turn_complete: Option<TurnHook>,
}

impl ChatController {
    /// Controller bound to the persisted session, or a fresh one if none was
    /// saved.
    pub fn new(api: ApiClient) -> Self {
        let session_ids = SessionIdStore::at(api.config().session_file.clone());
        let session_id = session_ids
            .load()
            .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));
        Self::with_session(api, session_id)
    }

    /// Controller bound to an explicit session id.
    pub fn with_session(api: ApiClient, session_id: impl Into<String>) -> Self {
        let session_ids = SessionIdStore::at(api.config().session_file.clone());
        Self {
            api,
            state: Arc::new(RwLock::new(SessionState::new(session_id))),
            active: Arc::new(Mutex::new(None)),
            session_ids,
            on_turn_complete: None,
        }
    }

    /// Register a callback fired at every turn boundary.
    pub fn on_turn_complete(mut self, hook: TurnHook) -> Self {
        self.on_turn_complete = Some(hook);
        self
    }

    pub async fn session_id(&self) -> String {
        self.state.read().await.turn.session_id.clone()
    }

    pub async fn status(&self) -> TurnStatus {
        self.state.read().await.turn.status
    }

    /// Copy of the current transcript.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.state.read().await.transcript.snapshot()
    }

    /// Send a user message and start streaming the reply.
    ///
    /// The user message lands in the transcript before this returns; the
    /// assistant reply arrives asynchronously through the spawned stream task.
    pub async fn send(&self, text: impl Into<String>, files: Vec<String>) {
        self.abort_active().await;

        let request = {
            let mut state = self.state.write().await;
            let user = UserMessage::new(text, files.clone());
            let session_id = state.turn.session_id.clone();
            state.transcript.append(Message::User(user.clone()));
            state.turn.reset();
            state.turn.status = TurnStatus::Generating;
            StreamRequest {
                text: user.content,
                files,
                session_id,
                assistant_id: self.api.config().assistant_id.clone(),
            }
        };

        info!(target: "carrel::session", "starting turn in session {}", request.session_id);

        let api = self.api.clone();
        let state = Arc::clone(&self.state);
        let hook = self.on_turn_complete.clone();
        let handle = tokio::spawn(async move {
            run_stream(api, state, hook, request).await;
        });
        *self.active.lock().await = Some(handle);
    }

    /// Cancel the in-flight turn, if any. Idempotent.
    ///
    /// The local abort is authoritative; the server-side stop is advisory and
    /// its failure is logged, not surfaced.
    pub async fn cancel(&self) {
        let handle = self.active.lock().await.take();
        let Some(handle) = handle else {
            debug!(target: "carrel::session", "cancel with no active stream");
            return;
        };
        handle.abort();

        let outcome = {
            let mut state = self.state.write().await;
            if state.turn.status != TurnStatus::Generating {
                // The stream already finished on its own; nothing to unwind.
                return;
            }
            let outcome = state.turn.outcome(true);
            state.turn.reset();
            outcome
        };

        info!(target: "carrel::session", "cancelled turn in session {}", outcome.session_id);
        if let Some(hook) = &self.on_turn_complete {
            hook(outcome.clone());
        }

        let api = self.api.clone();
        let session_id = outcome.session_id;
        tokio::spawn(async move {
            if let Err(e) = api.stop_generation(&session_id).await {
                debug!(target: "carrel::http", "advisory stop failed: {}", e);
            }
        });
    }

    /// Switch to another session, replacing local state with its replayed
    /// history.
    pub async fn switch_session(&self, session_id: &str) -> crate::api::Result<()> {
        self.abort_active().await;

        let history = self.api.fetch_history(session_id).await?;
        let transcript = build_transcript(history);

        let mut state = self.state.write().await;
        *state = SessionState::new(session_id);
        state.transcript = transcript;
        drop(state);

        if let Err(e) = self.session_ids.save(session_id) {
            warn!(target: "carrel::session", "failed to persist session id: {}", e);
        }
        info!(target: "carrel::session", "switched to session {}", session_id);
        Ok(())
    }

    /// List persisted sessions.
    pub async fn list_sessions(&self) -> crate::api::Result<Vec<carrel_types::SessionSummary>> {
        self.api.list_sessions().await
    }

    /// Delete a session server-side. Deleting the active session discards the
    /// local transcript and rebinds the controller to a fresh session.
    pub async fn delete_session(&self, session_id: &str) -> crate::api::Result<()> {
        self.api.delete_session(session_id).await?;
        if self.session_id().await == session_id {
            self.abort_active().await;
            let fresh = format!("session-{}", uuid::Uuid::new_v4());
            *self.state.write().await = SessionState::new(fresh);
            if let Err(e) = self.session_ids.clear() {
                warn!(target: "carrel::session", "failed to clear session id file: {}", e);
            }
        }
        Ok(())
    }

    /// Report feedback on a message. Fire and forget: failure is logged, the
    /// caller is never blocked or notified.
    pub fn send_feedback(&self, message_id: &str, kind: FeedbackKind) {
        let api = self.api.clone();
        let message_id = message_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = api.send_feedback(&message_id, kind).await {
                debug!(target: "carrel::http", "feedback delivery failed: {}", e);
            }
        });
    }

    /// Kick off podcast generation and watch the task to a terminal state.
    pub async fn generate_podcast(
        &self,
        request: &PodcastRequest,
    ) -> crate::api::Result<WatchResult> {
        let task = self.api.create_podcast(request).await?;
        info!(target: "carrel::podcast", "podcast task {} submitted", task.task_id);

        let api = self.api.clone();
        let task_id = task.task_id.clone();
        let result = TaskWatcher::default()
            .watch(move || {
                let api = api.clone();
                let task_id = task_id.clone();
                async move { api.podcast_status(&task_id).await }
            })
            .await;
        Ok(result)
    }

    async fn abort_active(&self) {
        if let Some(handle) = self.active.lock().await.take() {
            handle.abort();
        }
    }
}

/// Read the response stream to completion, feeding every decoded frame to the
/// interpreter.
async fn run_stream(
    api: ApiClient,
    state: Arc<RwLock<SessionState>>,
    hook: Option<TurnHook>,
    request: StreamRequest,
) {
    let mut stream = match api.open_stream(&request).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(target: "carrel::stream", "failed to open stream: {}", e);
            let outcome = {
                let mut state = state.write().await;
                state.turn.status = TurnStatus::ConnectionFailed;
                state.turn.outcome(false)
            };
            fire(&hook, outcome);
            return;
        }
    };

    let mut decoder = FrameDecoder::new();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(target: "carrel::stream", "stream read failed: {}", e);
                let outcome = {
                    let mut state = state.write().await;
                    state.turn.status = TurnStatus::ConnectionFailed;
                    state.turn.outcome(false)
                };
                fire(&hook, outcome);
                return;
            }
        };
        for frame in decoder.push(&chunk) {
            if apply_frame(&state, &hook, &frame).await {
                return;
            }
        }
    }

    // Stream ended. Flush a trailing unterminated frame, then close out the
    // turn if the server never sent a done marker.
    if let Some(frame) = decoder.finish() {
        if apply_frame(&state, &hook, &frame).await {
            return;
        }
    }

    let outcome = {
        let mut state = state.write().await;
        if state.turn.status != TurnStatus::Generating {
            return;
        }
        warn!(target: "carrel::stream", "stream ended without a done marker");
        let open = state.turn.open_assistant_id.take();
        state.turn.reset();
        state.turn.open_assistant_id = open;
        let outcome = state.turn.outcome(false);
        state.turn.open_assistant_id = None;
        outcome
    };
    fire(&hook, outcome);
}

/// Parse one frame and apply it. Returns true when the turn is over and the
/// stream task should exit.
async fn apply_frame(
    state: &Arc<RwLock<SessionState>>,
    hook: &Option<TurnHook>,
    frame: &str,
) -> bool {
    // A malformed frame is skipped, never fatal: the stream carries many more.
    let event: StreamEvent = match serde_json::from_str(frame) {
        Ok(event) => event,
        Err(e) => {
            warn!(target: "carrel::stream", "skipping malformed frame: {}", e);
            return false;
        }
    };

    let mut state = state.write().await;
    let SessionState { transcript, pending, turn } = &mut *state;
    match apply_event(event, turn, transcript, pending) {
        EventOutcome::Applied | EventOutcome::Ignored => false,
        EventOutcome::TurnDone => {
            let outcome = turn.outcome(false);
            turn.open_assistant_id = None;
            drop(state);
            fire(hook, outcome);
            true
        }
    }
}

fn fire(hook: &Option<TurnHook>, outcome: TurnOutcome) {
    if let Some(hook) = hook {
        hook(outcome);
    }
}
