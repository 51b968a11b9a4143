//! Remote replication client: authoritative document storage plus the live
//! query primitive the notification feed runs on.
//!
//! Writes are at-most-once. The trait is the seam the rest of the core (and
//! the tests) program against; [`HttpRemoteStore`] is the production
//! implementation.

use crate::notification::Notification;
use crate::report::IncidentRecord;
use async_trait::async_trait;

mod http;
mod subscription;

pub use http::{HttpRemoteStore, RemoteConfig};
pub use subscription::{subscribe_notifications, SubscriptionHandle};

/// Collection written by the submission coordinator.
pub const INCIDENTS_COLLECTION: &str = "incidents";
/// Collection the feed subscribes to, filtered by target user.
pub const NOTIFICATIONS_COLLECTION: &str = "notifications";

#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    #[error("remote request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote rejected request with status {status}")]
    Rejected { status: u16 },
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Store a new incident record; returns the id it was stored under.
    /// Implementations must not retry internally.
    async fn create_incident(&self, record: &IncidentRecord)
        -> Result<String, ReplicationError>;

    /// One-shot snapshot of the notifications targeting `user_id`,
    /// server-ordered newest first.
    async fn query_notifications(
        &self,
        user_id: &str,
    ) -> Result<Vec<Notification>, ReplicationError>;

    /// One-shot snapshot of the incidents `user_id` has submitted. Used
    /// where no live view is needed.
    async fn query_owned_incidents(
        &self,
        user_id: &str,
    ) -> Result<Vec<IncidentRecord>, ReplicationError>;
}
