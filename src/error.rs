use thiserror::Error;

/// Errors surfaced by the reconciliation core.
///
/// Non-match outcomes (no candidates in the window, best score below the
/// session threshold) are not errors; they are reported through
/// `MatchDecision` and `ReconcileOutcome`.
#[derive(Debug, Error)]
pub enum ConcordError {
    /// A pending record is missing required fields
    #[error("malformed pending record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    /// Manual reconcile referenced a meeting that does not exist
    #[error("unknown meeting id")]
    UnknownMeeting { meeting_id: String },

    /// Manual reconcile referenced an id that is not a valid identifier
    #[error("invalid meeting id format: {meeting_id}")]
    InvalidMeetingId { meeting_id: String },

    /// The pending record was already committed to a meeting
    #[error("pending record {id} is already reconciled")]
    AlreadyReconciled { id: String },

    /// No pending record exists under this identifier
    #[error("unknown pending record {id}")]
    UnknownPending { id: String },

    /// The transcript source could not be queried; retryable by the caller
    #[error("transcript source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    /// Pending store I/O failure
    #[error("pending store error at {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored record could not be decoded
    #[error("failed to decode record at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConcordError {
    /// Message suitable for direct display to an operator.
    pub fn display_reason(&self) -> String {
        self.to_string()
    }
}
