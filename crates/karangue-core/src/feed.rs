use crate::notification::{sort_newest_first, unread_count, Notification};
use crate::remote::{subscribe_notifications, RemoteStore, SubscriptionHandle};
use crate::session::Session;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::info;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Lifecycle of the notification channel for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// No authenticated session; nothing subscribed.
    Unattached,
    /// Session present, channel opening, no snapshot delivered yet.
    Subscribing,
    /// Snapshot delivered; the counter is accurate.
    Live,
}

/// The full current result set at a point in time. Each delivery replaces,
/// never merges with, the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub phase: FeedPhase,
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

impl FeedSnapshot {
    fn unattached() -> Self {
        Self {
            phase: FeedPhase::Unattached,
            notifications: Vec::new(),
            unread: 0,
        }
    }
}

struct FeedInner {
    session: Option<Session>,
    subscription: Option<SubscriptionHandle>,
}

/// Live view of the current user's notifications and the derived unread
/// count.
///
/// The session is an explicit input: every transition (sign-in, sign-out,
/// account switch) goes through [`NotificationFeed::set_session`], which
/// closes the previous channel before opening the next one. At no instant
/// are two channels for two different users live on one controller.
pub struct NotificationFeed {
    remote: Arc<dyn RemoteStore>,
    poll_interval: Duration,
    inner: Mutex<FeedInner>,
    tx: Arc<watch::Sender<FeedSnapshot>>,
    rx: watch::Receiver<FeedSnapshot>,
}

impl NotificationFeed {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self::with_poll_interval(remote, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(remote: Arc<dyn RemoteStore>, poll_interval: Duration) -> Self {
        let (tx, rx) = watch::channel(FeedSnapshot::unattached());
        Self {
            remote,
            poll_interval,
            inner: Mutex::new(FeedInner {
                session: None,
                subscription: None,
            }),
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.rx.borrow().clone()
    }

    pub fn phase(&self) -> FeedPhase {
        self.rx.borrow().phase
    }

    pub fn unread(&self) -> usize {
        self.rx.borrow().unread
    }

    /// Channel for consumers (badge, list view). Every value observed is a
    /// whole replacing snapshot.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.rx.clone()
    }

    /// React to an authentication transition. The old channel (if any) is
    /// torn down before a new one opens; handing back the current session
    /// is a no-op. Must be called from within a tokio runtime when a
    /// session is present.
    pub fn set_session(&self, session: Option<Session>) {
        let mut inner = self.inner.lock();
        if inner.session == session {
            return;
        }
        if let Some(mut subscription) = inner.subscription.take() {
            subscription.close();
        }
        inner.session = session.clone();

        let session = match session {
            Some(session) => session,
            None => {
                self.tx.send_replace(FeedSnapshot::unattached());
                info!("notification feed detached");
                return;
            }
        };

        self.tx.send_replace(FeedSnapshot {
            phase: FeedPhase::Subscribing,
            notifications: Vec::new(),
            unread: 0,
        });

        let tx = self.tx.clone();
        let handle = subscribe_notifications(
            self.remote.clone(),
            &session.user_id,
            self.poll_interval,
            move |mut notifications| {
                sort_newest_first(&mut notifications);
                let unread = unread_count(&notifications);
                tx.send_replace(FeedSnapshot {
                    phase: FeedPhase::Live,
                    notifications,
                    unread,
                });
            },
        );
        inner.subscription = Some(handle);
        info!(user_id = %session.user_id, "notification feed live query opened");
    }
}

impl Drop for NotificationFeed {
    fn drop(&mut self) {
        if let Some(mut subscription) = self.inner.lock().subscription.take() {
            subscription.close();
        }
    }
}
