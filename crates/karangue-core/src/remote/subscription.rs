//! Standing live query over the notifications collection.
//!
//! The remote store pushes whole result sets, not diffs: every observed
//! change re-delivers the full matching set for one user. The poll loop
//! below realizes that contract over the one-shot query primitive.

use super::RemoteStore;
use crate::notification::Notification;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tracing::{debug, warn};

/// Owned handle to an open live query.
///
/// `close` releases the channel and is idempotent; `Drop` closes as a
/// backstop so a discarded handle can never leak the listener. No snapshot
/// is delivered after `close` returns.
pub struct SubscriptionHandle {
    closed: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("notification live query closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Open a live query for one user's notifications.
///
/// The initial matching set is delivered on the first poll (immediately),
/// then the full set is re-delivered whenever a poll observes a change.
/// Failed polls are logged and retried at the next tick; they never tear
/// the channel down. Must be called from within a tokio runtime.
pub fn subscribe_notifications<F>(
    remote: Arc<dyn RemoteStore>,
    user_id: &str,
    poll_interval: Duration,
    on_snapshot: F,
) -> SubscriptionHandle
where
    F: Fn(Vec<Notification>) + Send + Sync + 'static,
{
    let closed = Arc::new(AtomicBool::new(false));
    let closed_in_task = closed.clone();
    let user_id = user_id.to_string();

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(poll_interval);
        let mut last: Option<Vec<Notification>> = None;
        loop {
            ticker.tick().await;
            if closed_in_task.load(Ordering::SeqCst) {
                return;
            }
            match remote.query_notifications(&user_id).await {
                Ok(snapshot) => {
                    if last.as_ref() == Some(&snapshot) {
                        continue;
                    }
                    // Check again: close() may have landed mid-poll and the
                    // consumer must not observe anything after it.
                    if closed_in_task.load(Ordering::SeqCst) {
                        return;
                    }
                    on_snapshot(snapshot.clone());
                    last = Some(snapshot);
                }
                Err(err) => warn!(error = %err, "notification poll failed"),
            }
        }
    });

    SubscriptionHandle {
        closed,
        task: Some(task),
    }
}
