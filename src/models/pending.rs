use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConcordError;

/// Meeting category governing matching weights and thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum SessionType {
    #[serde(rename = "1-on-1")]
    OneOnOne,
    #[serde(rename = "internal-sync")]
    InternalSync,
    #[serde(rename = "external-sync")]
    ExternalSync,
    #[serde(rename = "note-to-self")]
    NoteToSelf,
    #[default]
    #[serde(rename = "default")]
    Other,
}

impl From<String> for SessionType {
    fn from(tag: String) -> Self {
        SessionType::from_tag(&tag)
    }
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::OneOnOne => "1-on-1",
            SessionType::InternalSync => "internal-sync",
            SessionType::ExternalSync => "external-sync",
            SessionType::NoteToSelf => "note-to-self",
            SessionType::Other => "default",
        }
    }

    /// Parse the wire tag, falling back to the default profile for
    /// anything unrecognized.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "1-on-1" => SessionType::OneOnOne,
            "internal-sync" => SessionType::InternalSync,
            "external-sync" => SessionType::ExternalSync,
            "note-to-self" => SessionType::NoteToSelf,
            _ => SessionType::Other,
        }
    }

    /// Infer a session type from a meeting title when the summary did not
    /// carry one.
    pub fn infer_from_title(title: &str) -> Self {
        let t = title.to_lowercase();
        if t.contains("1:1") || t.contains("1-1") || t.contains("1 on 1") {
            return SessionType::OneOnOne;
        }
        if t.contains("sync") && t.contains("external") {
            return SessionType::ExternalSync;
        }
        if t.contains("sync") {
            return SessionType::InternalSync;
        }
        if t.contains("note") && t.contains("self") {
            return SessionType::NoteToSelf;
        }
        SessionType::Other
    }
}

/// Reconciliation state of a pending summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileStatus {
    Pending,
    Reconciled,
    Failed,
}

/// A meeting summary saved without a matched transcript yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSummary {
    /// Stable identifier (path or handle in the pending store)
    pub id: String,
    pub title: String,
    /// Meeting date at day granularity
    pub date: NaiveDate,
    /// Participant names from the summary frontmatter
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default = "default_session_type")]
    pub session_type: SessionType,
    /// Short excerpt of the raw transcript, when the summary carried one
    #[serde(default)]
    pub transcript_snippet: Option<String>,
    #[serde(default = "default_status")]
    pub status: ReconcileStatus,
    /// Meeting id committed on reconciliation
    #[serde(default)]
    pub matched_meeting_id: Option<String>,
}

fn default_session_type() -> SessionType {
    SessionType::Other
}

fn default_status() -> ReconcileStatus {
    ReconcileStatus::Pending
}

impl PendingSummary {
    /// Required-field validation at the boundary. A record missing its
    /// title is rejected with a named error kind rather than scored on
    /// best-effort fields.
    pub fn validate(&self) -> Result<(), ConcordError> {
        if self.id.trim().is_empty() {
            return Err(ConcordError::MalformedRecord {
                id: self.id.clone(),
                reason: "empty identifier".to_string(),
            });
        }
        if self.title.trim().is_empty() {
            return Err(ConcordError::MalformedRecord {
                id: self.id.clone(),
                reason: "empty title".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReconcileStatus::Pending
    }
}
