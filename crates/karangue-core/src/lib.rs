//! karangue-core — local-first incident reporting for the Karangue safety
//! app.
//!
//! # Dual persistence
//! A submitted report is appended to the on-device history first, then
//! replicated once to the remote store. Replication failures are surfaced
//! but never roll the local copy back: the user's own action stays visible
//! on the device that produced it.
//!
//! # Notification feed
//! One standing live query per authenticated session delivers replacing
//! snapshots of the user's notifications; the unread counter is derived
//! from the latest snapshot only.

pub mod feed;
pub mod history;
pub mod notification;
pub mod paths;
pub mod remote;
pub mod report;
pub mod session;
pub mod submit;

pub use feed::{FeedPhase, FeedSnapshot, NotificationFeed};
pub use history::HistoryStore;
pub use notification::Notification;
pub use remote::{HttpRemoteStore, RemoteConfig, RemoteStore, ReplicationError};
pub use report::{
    CaptureForm, GeoPoint, IncidentKind, IncidentRecord, Report, ResponderService,
    ValidationError,
};
pub use session::Session;
pub use submit::{SubmissionCoordinator, SubmitError, SubmitOutcome};
