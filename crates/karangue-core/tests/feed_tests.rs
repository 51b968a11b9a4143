use async_trait::async_trait;
use karangue_core::remote::subscribe_notifications;
use karangue_core::{
    FeedPhase, FeedSnapshot, IncidentRecord, Notification, NotificationFeed, RemoteStore,
    ReplicationError, Session,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Duration};

const POLL: Duration = Duration::from_millis(10);
const SETTLE: Duration = Duration::from_millis(100);

/// Remote double serving per-user notification sets that tests mutate to
/// simulate server-side pushes.
#[derive(Default)]
struct ServedRemote {
    notifications: Mutex<HashMap<String, Vec<Notification>>>,
}

impl ServedRemote {
    fn push(&self, user_id: &str, notification: Notification) {
        self.notifications
            .lock()
            .entry(user_id.to_string())
            .or_default()
            .push(notification);
    }
}

#[async_trait]
impl RemoteStore for ServedRemote {
    async fn create_incident(
        &self,
        _record: &IncidentRecord,
    ) -> Result<String, ReplicationError> {
        Ok("unused".to_string())
    }

    async fn query_notifications(
        &self,
        user_id: &str,
    ) -> Result<Vec<Notification>, ReplicationError> {
        Ok(self
            .notifications
            .lock()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_owned_incidents(
        &self,
        _user_id: &str,
    ) -> Result<Vec<IncidentRecord>, ReplicationError> {
        Ok(vec![])
    }
}

fn notif(id: &str, user_id: &str, date: Option<i64>, read: bool) -> Notification {
    Notification {
        id: id.to_string(),
        target_user_id: user_id.to_string(),
        title: format!("Alerte {id}"),
        description: "incident signalé près de chez vous".to_string(),
        date,
        read,
    }
}

async fn wait_until(
    rx: &mut watch::Receiver<FeedSnapshot>,
    pred: impl Fn(&FeedSnapshot) -> bool,
) -> FeedSnapshot {
    timeout(Duration::from_secs(2), async {
        loop {
            let current = rx.borrow_and_update().clone();
            if pred(&current) {
                return current;
            }
            rx.changed().await.expect("feed channel closed");
        }
    })
    .await
    .expect("timed out waiting for feed snapshot")
}

#[tokio::test]
async fn feed_starts_unattached() {
    let remote = Arc::new(ServedRemote::default());
    let feed = NotificationFeed::with_poll_interval(remote, POLL);
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.phase, FeedPhase::Unattached);
    assert!(snapshot.notifications.is_empty());
    assert_eq!(snapshot.unread, 0);
}

#[tokio::test]
async fn attach_delivers_initial_snapshot_and_goes_live() {
    let remote = Arc::new(ServedRemote::default());
    remote.push("alice", notif("n1", "alice", Some(100), false));
    remote.push("alice", notif("n2", "alice", Some(200), true));

    let feed = NotificationFeed::with_poll_interval(remote, POLL);
    let mut rx = feed.subscribe();
    feed.set_session(Some(Session::new("alice")));

    let snapshot = wait_until(&mut rx, |s| s.phase == FeedPhase::Live).await;
    assert_eq!(snapshot.notifications.len(), 2);
    // Newest first.
    assert_eq!(snapshot.notifications[0].id, "n2");
    assert_eq!(snapshot.unread, 1);
}

#[tokio::test]
async fn unread_count_is_recomputed_from_each_snapshot() {
    let remote = Arc::new(ServedRemote::default());
    remote.push("alice", notif("a", "alice", Some(300), false));
    remote.push("alice", notif("b", "alice", Some(200), true));
    remote.push("alice", notif("c", "alice", Some(100), false));

    let feed = NotificationFeed::with_poll_interval(remote.clone(), POLL);
    let mut rx = feed.subscribe();
    feed.set_session(Some(Session::new("alice")));

    let snapshot = wait_until(&mut rx, |s| s.phase == FeedPhase::Live).await;
    assert_eq!(snapshot.unread, 2);

    // A server-side change re-delivers the whole set; the counter follows
    // that snapshot alone.
    remote.push("alice", notif("d", "alice", Some(400), false));
    let snapshot = wait_until(&mut rx, |s| s.notifications.len() == 4).await;
    assert_eq!(snapshot.unread, 3);
    assert_eq!(snapshot.notifications[0].id, "d");
}

#[tokio::test]
async fn snapshots_replace_rather_than_merge() {
    let remote = Arc::new(ServedRemote::default());
    remote.push("alice", notif("old", "alice", Some(100), false));

    let feed = NotificationFeed::with_poll_interval(remote.clone(), POLL);
    let mut rx = feed.subscribe();
    feed.set_session(Some(Session::new("alice")));
    wait_until(&mut rx, |s| s.phase == FeedPhase::Live).await;

    // Server replaces the whole set (e.g. the old notice was deleted).
    remote.notifications.lock().insert(
        "alice".to_string(),
        vec![notif("fresh", "alice", Some(500), false)],
    );
    let snapshot = wait_until(&mut rx, |s| {
        s.notifications.len() == 1 && s.notifications[0].id == "fresh"
    })
    .await;
    assert_eq!(snapshot.unread, 1);
}

#[tokio::test]
async fn sign_out_detaches_and_freezes_the_view() {
    let remote = Arc::new(ServedRemote::default());
    remote.push("alice", notif("n1", "alice", Some(100), false));

    let feed = NotificationFeed::with_poll_interval(remote.clone(), POLL);
    let mut rx = feed.subscribe();
    feed.set_session(Some(Session::new("alice")));
    wait_until(&mut rx, |s| s.phase == FeedPhase::Live).await;

    feed.set_session(None);
    let snapshot = wait_until(&mut rx, |s| s.phase == FeedPhase::Unattached).await;
    assert!(snapshot.notifications.is_empty());

    // Server-side changes after sign-out must not reach the view.
    remote.push("alice", notif("n2", "alice", Some(200), false));
    sleep(SETTLE).await;
    assert_eq!(feed.phase(), FeedPhase::Unattached);
    assert_eq!(feed.unread(), 0);
}

#[tokio::test]
async fn session_switch_never_mixes_users() {
    let remote = Arc::new(ServedRemote::default());
    remote.push("alice", notif("a1", "alice", Some(100), false));
    remote.push("bob", notif("b1", "bob", Some(100), false));
    remote.push("bob", notif("b2", "bob", Some(200), false));

    let feed = NotificationFeed::with_poll_interval(remote.clone(), POLL);
    let mut rx = feed.subscribe();
    feed.set_session(Some(Session::new("alice")));
    wait_until(&mut rx, |s| s.phase == FeedPhase::Live).await;

    feed.set_session(Some(Session::new("bob")));
    // Every delivery from the moment of the switch belongs to bob: the old
    // channel is torn down before the new one opens.
    let snapshot = timeout(Duration::from_secs(2), async {
        loop {
            rx.changed().await.expect("feed channel closed");
            let current = rx.borrow().clone();
            assert!(
                current.notifications.iter().all(|n| n.target_user_id == "bob"),
                "snapshot leaked another user's notifications"
            );
            if current.phase == FeedPhase::Live {
                return current;
            }
        }
    })
    .await
    .expect("timed out waiting for switched feed");

    assert_eq!(snapshot.notifications.len(), 2);
    assert_eq!(snapshot.unread, 2);
}

#[tokio::test]
async fn setting_the_same_session_is_a_noop() {
    let remote = Arc::new(ServedRemote::default());
    remote.push("alice", notif("n1", "alice", Some(100), false));

    let feed = NotificationFeed::with_poll_interval(remote, POLL);
    let mut rx = feed.subscribe();
    feed.set_session(Some(Session::new("alice")));
    wait_until(&mut rx, |s| s.phase == FeedPhase::Live).await;

    rx.borrow_and_update();
    feed.set_session(Some(Session::new("alice")));
    sleep(SETTLE).await;
    // No teardown, no re-subscribe, no phase churn.
    assert!(!rx.has_changed().unwrap());
    assert_eq!(feed.phase(), FeedPhase::Live);
}

#[tokio::test]
async fn closed_subscription_delivers_nothing_more() {
    let remote = Arc::new(ServedRemote::default());
    remote.push("alice", notif("n1", "alice", Some(100), false));

    let deliveries = Arc::new(AtomicUsize::new(0));
    let counter = deliveries.clone();
    let mut handle = subscribe_notifications(
        remote.clone(),
        "alice",
        POLL,
        move |_snapshot| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    timeout(Duration::from_secs(2), async {
        while deliveries.load(Ordering::SeqCst) == 0 {
            sleep(POLL).await;
        }
    })
    .await
    .expect("initial snapshot never delivered");

    handle.close();
    handle.close(); // idempotent
    assert!(handle.is_closed());

    let seen = deliveries.load(Ordering::SeqCst);
    remote.push("alice", notif("n2", "alice", Some(200), false));
    sleep(SETTLE).await;
    assert_eq!(deliveries.load(Ordering::SeqCst), seen);
}

#[tokio::test]
async fn dropping_the_handle_closes_the_channel() {
    let remote = Arc::new(ServedRemote::default());
    remote.push("alice", notif("n1", "alice", Some(100), false));

    let deliveries = Arc::new(AtomicUsize::new(0));
    let counter = deliveries.clone();
    {
        let _handle = subscribe_notifications(
            remote.clone(),
            "alice",
            POLL,
            move |_snapshot| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        timeout(Duration::from_secs(2), async {
            while deliveries.load(Ordering::SeqCst) == 0 {
                sleep(POLL).await;
            }
        })
        .await
        .expect("initial snapshot never delivered");
    }

    let seen = deliveries.load(Ordering::SeqCst);
    remote.push("alice", notif("n2", "alice", Some(200), false));
    sleep(SETTLE).await;
    assert_eq!(deliveries.load(Ordering::SeqCst), seen);
}
