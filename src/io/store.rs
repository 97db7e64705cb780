use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConcordError;
use crate::models::PendingSummary;
use crate::reconcile::PendingStore;

/// Pending store backed by a directory of JSON files, one record per
/// file. The file stem is the record id, so ids stay stable across
/// rewrites and a record can be inspected or fixed up with a text
/// editor.
pub struct FilePendingStore {
    dir: PathBuf,
}

impl FilePendingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read_record(&self, path: &Path, id: &str) -> Result<PendingSummary, ConcordError> {
        let content = fs::read_to_string(path).map_err(|e| store_err(path, e))?;
        let mut summary: PendingSummary =
            serde_json::from_str(&content).map_err(|e| ConcordError::Decode {
                path: path.display().to_string(),
                source: e,
            })?;
        // The file stem is authoritative for the id
        summary.id = id.to_string();
        Ok(summary)
    }

    fn write_record(&self, id: &str, summary: &PendingSummary) -> Result<(), ConcordError> {
        let path = self.record_path(id);
        let json = serde_json::to_string_pretty(summary).map_err(|e| ConcordError::Decode {
            path: path.display().to_string(),
            source: e,
        })?;
        fs::write(&path, json).map_err(|e| store_err(&path, e))
    }
}

impl PendingStore for FilePendingStore {
    fn list_ids(&self) -> Result<Vec<String>, ConcordError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| store_err(&self.dir, e))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| store_err(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        debug!(count = ids.len(), dir = %self.dir.display(), "listed pending records");
        Ok(ids)
    }

    fn load(&self, id: &str) -> Result<PendingSummary, ConcordError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(ConcordError::UnknownPending { id: id.to_string() });
        }
        self.read_record(&path, id)
    }

    fn mark_reconciled(&self, id: &str, meeting_id: &str) -> Result<(), ConcordError> {
        let mut summary = self.load(id)?;
        summary.status = crate::models::ReconcileStatus::Reconciled;
        summary.matched_meeting_id = Some(meeting_id.to_string());
        self.write_record(id, &summary)
    }
}

fn store_err(path: &Path, source: std::io::Error) -> ConcordError {
    ConcordError::Store {
        path: path.display().to_string(),
        source,
    }
}
