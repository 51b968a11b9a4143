use crate::history::HistoryStore;
use crate::remote::{RemoteStore, ReplicationError};
use crate::report::{CaptureForm, IncidentRecord, Report, ValidationError};
use crate::session::Session;
use chrono::Local;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("local history write failed: {0}")]
    LocalStore(#[source] anyhow::Error),
    #[error(transparent)]
    Replication(#[from] ReplicationError),
}

/// Two-phase result of a submission. The two flags are reported separately
/// because the contract is asymmetric: a report that reached the device
/// cache stays there even when replication fails.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub local_ok: bool,
    pub remote_ok: bool,
    pub error: Option<SubmitError>,
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        self.local_ok && self.remote_ok
    }

    fn failed(error: SubmitError) -> Self {
        Self {
            local_ok: false,
            remote_ok: false,
            error: Some(error),
        }
    }
}

/// The only place a new [`Report`] is born. Validates the draft, appends it
/// to the local history, then replicates it once to the remote store.
pub struct SubmissionCoordinator {
    history: HistoryStore,
    remote: Arc<dyn RemoteStore>,
}

impl SubmissionCoordinator {
    pub fn new(history: HistoryStore, remote: Arc<dyn RemoteStore>) -> Self {
        Self { history, remote }
    }

    /// Capture timestamp shown in the history list. Assigned once at
    /// submission, immutable afterwards.
    fn capture_date() -> String {
        Local::now().format("%d/%m/%Y %H:%M:%S").to_string()
    }

    /// Run the dual-write sequence. The local append always strictly
    /// precedes the remote attempt; the remote attempt happens at most
    /// once. On overall success the form is reset to its preset state.
    pub async fn submit(&self, form: &mut CaptureForm, session: &Session) -> SubmitOutcome {
        if let Err(err) = form.validate() {
            return SubmitOutcome::failed(err.into());
        }

        let report = Report {
            id: Uuid::new_v4().to_string(),
            kind: form.kind,
            service: form.service,
            description: form.description.trim().to_string(),
            image: form.image.clone(),
            location: form.location,
            date: Self::capture_date(),
        };

        // Local first: the history and map views must reflect the capture
        // even if replication never succeeds.
        if let Err(err) = self.history.prepend(&report) {
            warn!(error = %err, "history append failed");
            return SubmitOutcome::failed(SubmitError::LocalStore(err));
        }

        let record = IncidentRecord::new(report, &session.user_id);
        match self.remote.create_incident(&record).await {
            Ok(remote_id) => {
                info!(id = %record.report.id, remote_id = %remote_id, "report replicated");
                form.reset();
                SubmitOutcome {
                    local_ok: true,
                    remote_ok: true,
                    error: None,
                }
            }
            Err(err) => {
                // No rollback: the local copy stands.
                warn!(error = %err, id = %record.report.id, "report replication failed");
                SubmitOutcome {
                    local_ok: true,
                    remote_ok: false,
                    error: Some(err.into()),
                }
            }
        }
    }
}
