use chrono::{NaiveTime, TimeZone, Utc};
use tracing::debug;

use crate::config::MatchConfig;
use crate::models::{MeetingRecord, PendingSummary};

/// Candidate pool for one pending summary: the window center plus every
/// meeting whose start falls inside it.
#[derive(Debug)]
pub struct CandidatePool<'a> {
    pub center_ms: i64,
    pub half_window_ms: i64,
    pub meetings: Vec<&'a MeetingRecord>,
}

impl CandidatePool<'_> {
    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }
}

/// Epoch-millisecond center of the candidate window: noon UTC on the
/// summary's date.
pub fn window_center_ms(summary: &PendingSummary) -> i64 {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
    let dt = Utc.from_utc_datetime(&summary.date.and_time(noon));
    dt.timestamp_millis()
}

/// Filter the meeting pool to records whose start timestamp lies within
/// the symmetric time window around the summary's date. Pure; an empty
/// result is the legitimate NoCandidates outcome, not an error.
///
/// Meetings without a start timestamp cannot be placed in the window and
/// are excluded, as are meetings carrying no transcript text.
pub fn generate_candidates<'a>(
    summary: &PendingSummary,
    pool: &'a [MeetingRecord],
    config: &MatchConfig,
) -> CandidatePool<'a> {
    let center_ms = window_center_ms(summary);
    let half = config.half_window_ms();
    let lo = center_ms - half;
    let hi = center_ms + half;

    let meetings: Vec<&MeetingRecord> = pool
        .iter()
        .filter(|m| m.has_transcript())
        .filter(|m| match m.start_ms {
            Some(start) => start >= lo && start <= hi,
            None => false,
        })
        .collect();

    debug!(
        pending = %summary.id,
        window_hours = config.window_hours,
        pool = pool.len(),
        candidates = meetings.len(),
        "generated candidate pool"
    );

    CandidatePool {
        center_ms,
        half_window_ms: half,
        meetings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReconcileStatus, SessionType, SpeakerBlock};
    use chrono::NaiveDate;

    fn summary() -> PendingSummary {
        PendingSummary {
            id: "p1".to_string(),
            title: "1:1 Sync".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 22).unwrap(),
            participants: vec!["Alice".to_string(), "Bob".to_string()],
            session_type: SessionType::OneOnOne,
            transcript_snippet: None,
            status: ReconcileStatus::Pending,
            matched_meeting_id: None,
        }
    }

    fn meeting(id: &str, start_ms: Option<i64>) -> MeetingRecord {
        MeetingRecord {
            id: id.to_string(),
            title: "Alice/Bob Weekly".to_string(),
            participants: Some("Alice, Bob".to_string()),
            start_ms,
            end_ms: start_ms.map(|s| s + 1_800_000),
            blocks: vec![SpeakerBlock {
                speaker_id: "1".to_string(),
                text: "hello".to_string(),
                start_ms: Some(0),
                end_ms: Some(500),
                source: None,
            }],
        }
    }

    #[test]
    fn test_window_includes_same_day() {
        let s = summary();
        let center = window_center_ms(&s);
        let pool = vec![meeting("m1", Some(center + 3_600_000))];
        let cands = generate_candidates(&s, &pool, &MatchConfig::default());
        assert_eq!(cands.meetings.len(), 1);
    }

    #[test]
    fn test_window_excludes_far_meetings() {
        let s = summary();
        let center = window_center_ms(&s);
        // 40 hours out, window is ±36h
        let pool = vec![meeting("m1", Some(center + 40 * 3600 * 1000))];
        let cands = generate_candidates(&s, &pool, &MatchConfig::default());
        assert!(cands.is_empty());
    }

    #[test]
    fn test_excludes_missing_start_and_empty_transcript() {
        let s = summary();
        let center = window_center_ms(&s);
        let mut no_blocks = meeting("m2", Some(center));
        no_blocks.blocks.clear();
        let pool = vec![meeting("m1", None), no_blocks];
        let cands = generate_candidates(&s, &pool, &MatchConfig::default());
        assert!(cands.is_empty());
    }
}
