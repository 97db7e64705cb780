use std::path::Path;

use tracing::debug;

use crate::error::ConcordError;
use crate::models::MeetingRecord;
use crate::reconcile::TranscriptSource;

/// Transcript source backed by a single JSON file holding an array of
/// meeting records, loaded once up front.
#[derive(Debug)]
pub struct JsonMeetingPool {
    meetings: Vec<MeetingRecord>,
}

impl JsonMeetingPool {
    pub fn from_file(path: &Path) -> Result<Self, ConcordError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConcordError::SourceUnavailable {
            reason: format!("{}: {e}", path.display()),
        })?;
        let meetings: Vec<MeetingRecord> =
            serde_json::from_str(&content).map_err(|e| ConcordError::Decode {
                path: path.display().to_string(),
                source: e,
            })?;
        debug!(count = meetings.len(), path = %path.display(), "loaded meeting pool");
        Ok(Self { meetings })
    }

    pub fn from_meetings(meetings: Vec<MeetingRecord>) -> Self {
        Self { meetings }
    }

    pub fn len(&self) -> usize {
        self.meetings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }
}

impl TranscriptSource for JsonMeetingPool {
    fn meeting(&self, meeting_id: &str) -> Result<Option<MeetingRecord>, ConcordError> {
        Ok(self.meetings.iter().find(|m| m.id == meeting_id).cloned())
    }

    fn meetings(&self) -> Result<Vec<MeetingRecord>, ConcordError> {
        Ok(self.meetings.clone())
    }
}
