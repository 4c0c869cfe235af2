//! Podcast task watcher.
//!
//! Podcast synthesis is a one-shot background job on the server, so its
//! status check is a bounded polling loop with a fixed backoff, kept separate
//! from the chat streaming core (which has no timeout of its own).

use carrel_types::PodcastTask;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Polling bounds for one watched task.
#[derive(Debug, Clone, Copy)]
pub struct TaskWatcher {
    /// Maximum number of status polls before giving up.
    pub max_polls: u32,
    /// Fixed delay between polls.
    pub interval: Duration,
}

impl Default for TaskWatcher {
    fn default() -> Self {
        Self { max_polls: 60, interval: Duration::from_secs(5) }
    }
}

/// Final result of watching a task.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchResult {
    /// The task reached a terminal state within the poll budget.
    Finished(PodcastTask),
    /// The poll budget ran out before the task finished.
    TimedOut,
}

impl TaskWatcher {
    pub fn new(max_polls: u32, interval: Duration) -> Self {
        Self { max_polls, interval }
    }

    /// Poll `fetch` until the task reaches a terminal state or the poll
    /// budget runs out. A failed poll is logged and counts against the
    /// budget; it never aborts the watch on its own.
    pub async fn watch<F, Fut, E>(&self, mut fetch: F) -> WatchResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<PodcastTask, E>>,
        E: Display,
    {
        for attempt in 1..=self.max_polls {
            match fetch().await {
                Ok(task) if task.state.is_terminal() => {
                    debug!(
                        target: "carrel::podcast",
                        "task {} finished in state {:?} after {} polls",
                        task.task_id, task.state, attempt
                    );
                    return WatchResult::Finished(task);
                }
                Ok(task) => {
                    debug!(
                        target: "carrel::podcast",
                        "task {} still {:?} (poll {}/{})",
                        task.task_id, task.state, attempt, self.max_polls
                    );
                }
                Err(e) => {
                    warn!(target: "carrel::podcast", "status poll failed: {}", e);
                }
            }
            if attempt < self.max_polls {
                sleep(self.interval).await;
            }
        }
        WatchResult::TimedOut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrel_types::PodcastTaskState;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn task(state: PodcastTaskState) -> PodcastTask {
        PodcastTask {
            task_id: "p1".to_string(),
            state,
            audio_url: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_watch_finishes_on_terminal_state() {
        let polls = AtomicU32::new(0);
        let watcher = TaskWatcher::new(10, Duration::from_millis(1));

        let result = watcher
            .watch(|| {
                let n = polls.fetch_add(1, Ordering::SeqCst);
                async move {
                    Ok::<_, String>(match n {
                        0 => task(PodcastTaskState::Pending),
                        1 => task(PodcastTaskState::Started),
                        _ => task(PodcastTaskState::Success),
                    })
                }
            })
            .await;

        assert_eq!(result, WatchResult::Finished(task(PodcastTaskState::Success)));
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_watch_times_out_at_poll_cap() {
        let polls = AtomicU32::new(0);
        let watcher = TaskWatcher::new(4, Duration::from_millis(1));

        let result = watcher
            .watch(|| {
                polls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, String>(task(PodcastTaskState::Started)) }
            })
            .await;

        assert_eq!(result, WatchResult::TimedOut);
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_poll_failures_count_against_budget() {
        let polls = AtomicU32::new(0);
        let watcher = TaskWatcher::new(3, Duration::from_millis(1));

        let result = watcher
            .watch(|| {
                let n = polls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err("connection reset".to_string())
                    } else {
                        Ok(task(PodcastTaskState::Failure))
                    }
                }
            })
            .await;

        match result {
            WatchResult::Finished(t) => assert_eq!(t.state, PodcastTaskState::Failure),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_is_terminal() {
        let watcher = TaskWatcher::new(2, Duration::from_millis(1));
        let result = watcher
            .watch(|| async { Ok::<_, String>(task(PodcastTaskState::Cancelled)) })
            .await;

        assert!(matches!(result, WatchResult::Finished(_)));
    }
}
