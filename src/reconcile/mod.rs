use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::MatchConfig;
use crate::error::ConcordError;
use crate::matching::{generate_candidates, rank_candidates, MatchDecision};
use crate::models::{MeetingRecord, PendingSummary};

/// Durable store of not-yet-reconciled summaries, keyed by a stable
/// identifier. The core only ever moves records pending -> reconciled.
pub trait PendingStore {
    fn list_ids(&self) -> Result<Vec<String>, ConcordError>;
    fn load(&self, id: &str) -> Result<PendingSummary, ConcordError>;
    fn mark_reconciled(&self, id: &str, meeting_id: &str) -> Result<(), ConcordError>;
}

/// Read-only provider of candidate meeting records. Unavailability is
/// fatal for the current operation and retryable by the caller; the core
/// performs no retries.
pub trait TranscriptSource {
    fn meeting(&self, meeting_id: &str) -> Result<Option<MeetingRecord>, ConcordError>;
    fn meetings(&self) -> Result<Vec<MeetingRecord>, ConcordError>;
}

/// Per-record outcome of an auto-reconcile run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub id: String,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_meeting_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Why this record matched or didn't, suitable for display
    pub reason: String,
}

/// Aggregate result of one auto-reconcile batch.
#[derive(Debug, Serialize)]
pub struct AutoReconcileReport {
    /// Identifier of this batch run
    pub run_id: String,
    pub attempted: usize,
    pub matched: usize,
    pub failed: usize,
    pub outcomes: Vec<ReconcileOutcome>,
}

/// Successful manual reconciliation.
#[derive(Debug, Serialize)]
pub struct ManualMatch {
    pub matched_meeting_id: String,
    pub title: String,
}

/// Orchestrates auto and manual reconciliation over a pending store and
/// a transcript source. Commits are serialized through a single writer
/// lock with a status re-check inside it, so a concurrent auto batch and
/// manual pick can never both commit the same record. Scoring runs
/// outside the lock.
pub struct Reconciler {
    config: MatchConfig,
    commit_lock: Mutex<()>,
}

impl Reconciler {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Generate and rank candidates for one pending record without
    /// committing anything.
    pub fn candidates_for(
        &self,
        store: &dyn PendingStore,
        source: &dyn TranscriptSource,
        pending_id: &str,
    ) -> Result<MatchDecision, ConcordError> {
        let summary = store.load(pending_id)?;
        summary.validate()?;
        let pool = source.meetings()?;
        let candidates = generate_candidates(&summary, &pool, &self.config);
        Ok(rank_candidates(&summary, &candidates, &self.config))
    }

    /// Auto mode: score every pending record and commit confident
    /// matches. Already-reconciled records are skipped, never rescored.
    /// Safe to re-run; a malformed record fails that record only.
    pub fn auto_reconcile(
        &self,
        store: &dyn PendingStore,
        source: &dyn TranscriptSource,
    ) -> Result<AutoReconcileReport, ConcordError> {
        let pool = source.meetings()?;
        let ids = store.list_ids()?;

        let mut outcomes = Vec::new();
        let mut attempted = 0usize;
        let mut matched = 0usize;
        let mut failed = 0usize;

        for id in ids {
            let summary = match store.load(&id) {
                Ok(s) => s,
                Err(e) => {
                    failed += 1;
                    attempted += 1;
                    outcomes.push(failure(&id, &e));
                    continue;
                }
            };
            if !summary.is_pending() {
                continue;
            }
            attempted += 1;

            if let Err(e) = summary.validate() {
                failed += 1;
                outcomes.push(failure(&id, &e));
                continue;
            }

            let candidates = generate_candidates(&summary, &pool, &self.config);
            let decision = rank_candidates(&summary, &candidates, &self.config);

            match decision {
                MatchDecision::Confident { best, .. } => {
                    match self.commit(store, &id, &best.meeting_id) {
                        Ok(()) => {
                            matched += 1;
                            info!(pending = %id, meeting = %best.meeting_id, score = best.score, "reconciled");
                            outcomes.push(ReconcileOutcome {
                                id,
                                matched: true,
                                matched_meeting_id: Some(best.meeting_id),
                                error: None,
                                reason: best.reason,
                            });
                        }
                        // Lost the race to a concurrent commit; the record
                        // is reconciled either way.
                        Err(ConcordError::AlreadyReconciled { .. }) => {}
                        Err(e) => {
                            failed += 1;
                            outcomes.push(failure(&id, &e));
                        }
                    }
                }
                MatchDecision::BelowThreshold { ranked } => {
                    let top = ranked.first();
                    outcomes.push(ReconcileOutcome {
                        id,
                        matched: false,
                        matched_meeting_id: None,
                        error: None,
                        reason: match top {
                            Some(c) => format!(
                                "no match above threshold; best {} scored {:.2}",
                                c.meeting_id, c.score
                            ),
                            None => "no match above threshold".to_string(),
                        },
                    });
                }
                MatchDecision::NoCandidates => {
                    outcomes.push(ReconcileOutcome {
                        id,
                        matched: false,
                        matched_meeting_id: None,
                        error: None,
                        reason: "no candidates in window".to_string(),
                    });
                }
            }
        }

        let report = AutoReconcileReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            attempted,
            matched,
            failed,
            outcomes,
        };
        info!(
            run_id = %report.run_id,
            attempted = report.attempted,
            matched = report.matched,
            failed = report.failed,
            "auto-reconcile batch complete"
        );
        Ok(report)
    }

    /// Manual mode: commit an operator-supplied meeting for one pending
    /// record, bypassing scoring. The identifier must resolve to an
    /// existing meeting; the record must still be pending.
    pub fn manual_reconcile(
        &self,
        store: &dyn PendingStore,
        source: &dyn TranscriptSource,
        pending_id: &str,
        meeting_id: &str,
    ) -> Result<ManualMatch, ConcordError> {
        if meeting_id.trim().is_empty() {
            return Err(ConcordError::InvalidMeetingId {
                meeting_id: meeting_id.to_string(),
            });
        }

        let meeting = source
            .meeting(meeting_id)?
            .ok_or_else(|| ConcordError::UnknownMeeting {
                meeting_id: meeting_id.to_string(),
            })?;

        self.commit(store, pending_id, &meeting.id)?;
        info!(pending = %pending_id, meeting = %meeting.id, "manually reconciled");

        Ok(ManualMatch {
            matched_meeting_id: meeting.id,
            title: meeting.title,
        })
    }

    /// Atomic pending -> reconciled transition. The status re-check runs
    /// under the lock so at most one caller commits a given record.
    fn commit(
        &self,
        store: &dyn PendingStore,
        pending_id: &str,
        meeting_id: &str,
    ) -> Result<(), ConcordError> {
        let _guard = self
            .commit_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let current = store.load(pending_id)?;
        if !current.is_pending() {
            warn!(pending = %pending_id, "commit skipped, record no longer pending");
            return Err(ConcordError::AlreadyReconciled {
                id: pending_id.to_string(),
            });
        }
        store.mark_reconciled(pending_id, meeting_id)
    }
}

fn failure(id: &str, e: &ConcordError) -> ReconcileOutcome {
    ReconcileOutcome {
        id: id.to_string(),
        matched: false,
        matched_meeting_id: None,
        error: Some(e.display_reason()),
        reason: e.display_reason(),
    }
}
