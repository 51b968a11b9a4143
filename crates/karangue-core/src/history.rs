use crate::report::Report;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Device-local cache of this installation's own reports, newest first.
///
/// The whole list is persisted as a single JSON document. Writes go through
/// a temp file in the same directory followed by a rename, so an interrupted
/// write leaves the last successfully persisted list intact. The store
/// assumes one thread of control and must not be shared across processes.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at the default location (`reports.json` under the app data
    /// dir, `KARANGUE_DATA_DIR` override honored).
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(crate::paths::history_path()?))
    }

    /// Full stored list, newest first. A missing or unreadable file reads as
    /// an empty history; capture must never be blocked by a corrupt cache.
    pub fn load_all(&self) -> Vec<Report> {
        if !self.path.exists() {
            return Vec::new();
        }
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "history unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&data) {
            Ok(reports) => reports,
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "history parse failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Reports that carry a location fix, for the map view.
    pub fn load_geotagged(&self) -> Vec<Report> {
        self.load_all()
            .into_iter()
            .filter(|r| r.location.is_some())
            .collect()
    }

    /// Insert at the front and persist the full updated list. Most-recent
    /// first is a structural invariant of the store, not a sort applied at
    /// read time.
    pub fn prepend(&self, report: &Report) -> Result<()> {
        let mut reports = self.load_all();
        reports.insert(0, report.clone());
        self.persist(&reports)
    }

    fn persist(&self, reports: &[Report]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| anyhow!("history path has no parent directory"))?;
        fs::create_dir_all(dir)?;
        let json = serde_json::to_vec(reports)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .with_context(|| format!("persist {}", self.path.display()))?;
        Ok(())
    }
}
