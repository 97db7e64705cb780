pub mod config;
pub mod consolidate;
pub mod error;
pub mod io;
pub mod matching;
pub mod models;
pub mod reconcile;
pub mod similarity;

pub use config::{MatchConfig, SessionProfile, WeightProfile};
pub use consolidate::{assign_display_names, consolidate_speakers, ConsolidationResult, MeetingContext};
pub use error::ConcordError;
pub use io::{FilePendingStore, JsonMeetingPool};
pub use matching::{generate_candidates, rank_candidates, window_center_ms, MatchDecision};
pub use models::{Candidate, MeetingRecord, PendingSummary, SessionType, SpeakerBlock, SubScores};
pub use reconcile::{
    AutoReconcileReport, PendingStore, Reconciler, ReconcileOutcome, TranscriptSource,
};
