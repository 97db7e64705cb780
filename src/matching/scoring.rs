use std::cmp::Ordering;

use tracing::debug;

use crate::config::MatchConfig;
use crate::models::{normalize_name_set, Candidate, MeetingRecord, PendingSummary, SubScores};
use crate::similarity::{
    jaccard, longest_substring_fraction, normalize_title, sequence_ratio, time_decay,
};

use super::candidates::CandidatePool;

/// Credit multiplier when the snippet only matches deeper into the
/// transcript than the prefix.
const EXTENDED_MATCH_CREDIT: f64 = 0.8;
/// How many blocks the extended snippet search covers.
const EXTENDED_PREFIX_BLOCKS: usize = 50;

/// Outcome of scoring one candidate pool.
#[derive(Debug)]
pub enum MatchDecision {
    /// Best candidate cleared the session type's threshold
    Confident {
        best: Candidate,
        ranked: Vec<Candidate>,
    },
    /// Ranked list exists but nothing cleared the threshold
    BelowThreshold { ranked: Vec<Candidate> },
    /// The window held no scoreable meetings
    NoCandidates,
}

impl MatchDecision {
    pub fn ranked(&self) -> &[Candidate] {
        match self {
            MatchDecision::Confident { ranked, .. } => ranked,
            MatchDecision::BelowThreshold { ranked } => ranked,
            MatchDecision::NoCandidates => &[],
        }
    }

    pub fn confident_match(&self) -> Option<&Candidate> {
        match self {
            MatchDecision::Confident { best, .. } => Some(best),
            _ => None,
        }
    }
}

/// Score one candidate meeting against a pending summary.
///
/// A malformed or missing timestamp degrades the time sub-score to 0.0
/// and is noted in the reason string; it never fails the candidate.
pub fn score_candidate(
    summary: &PendingSummary,
    meeting: &MeetingRecord,
    center_ms: i64,
    half_window_ms: i64,
    config: &MatchConfig,
) -> Candidate {
    let weights = config.profile(summary.session_type).weights;

    // 1. Participant overlap (Jaccard over normalized, alias-resolved sets)
    let want = normalize_name_set(&summary.participants, config);
    let have: std::collections::HashSet<String> =
        meeting.participant_names(config).into_iter().collect();
    let participant = jaccard(&want, &have);

    // 2. Title similarity
    let title = sequence_ratio(&normalize_title(&summary.title), &normalize_title(&meeting.title));

    // 3. Time proximity
    let mut degraded = None;
    let (time, time_offset_ms) = match meeting.midpoint_ms() {
        Some(mid) => {
            let offset = mid - center_ms;
            (time_decay(offset, half_window_ms), offset.abs())
        }
        None => {
            degraded = Some("no usable timestamp, time score degraded to 0");
            (0.0, i64::MAX)
        }
    };

    // 4. Snippet match
    let snippet = match &summary.transcript_snippet {
        Some(s) if !s.trim().is_empty() => snippet_score(s, meeting, config),
        _ => 0.0,
    };

    let score = weights.participant * participant
        + weights.title * title
        + weights.time * time
        + weights.snippet * snippet;

    let mut reason = format!(
        "participant={participant:.2} title={title:.2} time={time:.2} snippet={snippet:.2} ({})",
        summary.session_type.as_str()
    );
    if let Some(note) = degraded {
        reason.push_str("; ");
        reason.push_str(note);
    }

    Candidate {
        meeting_id: meeting.id.clone(),
        meeting_title: meeting.title.clone(),
        score,
        sub_scores: SubScores {
            participant,
            title,
            time,
            snippet,
        },
        time_offset_ms,
        reason,
    }
}

/// Snippet score: 1.0 when the normalized snippet appears verbatim in the
/// transcript prefix, otherwise graded by the longest matching substring;
/// matches found only in the wider extent earn reduced credit.
fn snippet_score(snippet: &str, meeting: &MeetingRecord, config: &MatchConfig) -> f64 {
    let needle = normalize_snippet(snippet);
    if needle.is_empty() {
        return 0.0;
    }

    let prefix = normalize_snippet(&meeting.transcript_prefix(config.snippet_prefix_blocks));
    if prefix.contains(&needle) {
        return 1.0;
    }
    let prefix_score = longest_substring_fraction(&needle, &prefix);

    if prefix_score < 0.3 && meeting.blocks.len() > config.snippet_prefix_blocks {
        let extended = normalize_snippet(&meeting.transcript_prefix(EXTENDED_PREFIX_BLOCKS));
        if extended.contains(&needle) {
            return prefix_score.max(EXTENDED_MATCH_CREDIT);
        }
        let extended_score =
            longest_substring_fraction(&needle, &extended) * EXTENDED_MATCH_CREDIT;
        return prefix_score.max(extended_score);
    }

    prefix_score
}

fn normalize_snippet(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rank every candidate in the pool and apply the threshold policy for
/// the summary's session type.
///
/// Ordering is fully deterministic: descending composite score, then
/// smaller absolute time offset, then lexicographically smaller meeting
/// id.
pub fn rank_candidates(
    summary: &PendingSummary,
    pool: &CandidatePool<'_>,
    config: &MatchConfig,
) -> MatchDecision {
    if pool.is_empty() {
        return MatchDecision::NoCandidates;
    }

    let mut ranked: Vec<Candidate> = pool
        .meetings
        .iter()
        .map(|m| score_candidate(summary, m, pool.center_ms, pool.half_window_ms, config))
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.time_offset_ms.cmp(&b.time_offset_ms))
            .then_with(|| a.meeting_id.cmp(&b.meeting_id))
    });

    let threshold = config.profile(summary.session_type).threshold;
    let best = &ranked[0];
    debug!(
        pending = %summary.id,
        best_meeting = %best.meeting_id,
        score = best.score,
        threshold,
        "ranked {} candidates",
        ranked.len()
    );

    if best.score >= threshold {
        MatchDecision::Confident {
            best: best.clone(),
            ranked,
        }
    } else {
        MatchDecision::BelowThreshold { ranked }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::candidates::{generate_candidates, window_center_ms};
    use crate::models::{ReconcileStatus, SessionType, SpeakerBlock};
    use chrono::NaiveDate;

    fn summary(session_type: SessionType) -> PendingSummary {
        PendingSummary {
            id: "p1".to_string(),
            title: "1:1 Sync".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 22).unwrap(),
            participants: vec!["Alice".to_string(), "Bob".to_string()],
            session_type,
            transcript_snippet: None,
            status: ReconcileStatus::Pending,
            matched_meeting_id: None,
        }
    }

    fn meeting(id: &str, title: &str, participants: &str, start_ms: i64) -> MeetingRecord {
        MeetingRecord {
            id: id.to_string(),
            title: title.to_string(),
            participants: Some(participants.to_string()),
            start_ms: Some(start_ms),
            end_ms: Some(start_ms),
            blocks: vec![SpeakerBlock {
                speaker_id: "1".to_string(),
                text: "we talked about the roadmap".to_string(),
                start_ms: Some(0),
                end_ms: Some(2000),
                source: None,
            }],
        }
    }

    #[test]
    fn test_one_on_one_scenario_commits() {
        let s = summary(SessionType::OneOnOne);
        let config = MatchConfig::default();
        let center = window_center_ms(&s);
        let pool_vec = vec![meeting("m1", "Alice/Bob Weekly", "Alice, Bob", center)];
        let pool = generate_candidates(&s, &pool_vec, &config);
        let decision = rank_candidates(&s, &pool, &config);

        let best = decision.confident_match().expect("should clear threshold");
        assert_eq!(best.meeting_id, "m1");
        assert!(best.score >= config.profile(SessionType::OneOnOne).threshold);
        assert_eq!(best.sub_scores.participant, 1.0);
        assert_eq!(best.sub_scores.time, 1.0);
    }

    #[test]
    fn test_no_candidates_outside_window() {
        let s = summary(SessionType::OneOnOne);
        let config = MatchConfig::default();
        let center = window_center_ms(&s);
        let pool_vec = vec![meeting(
            "m1",
            "Alice/Bob Weekly",
            "Alice, Bob",
            center + 48 * 3600 * 1000,
        )];
        let pool = generate_candidates(&s, &pool_vec, &config);
        assert!(matches!(
            rank_candidates(&s, &pool, &config),
            MatchDecision::NoCandidates
        ));
    }

    #[test]
    fn test_ranked_list_available_below_threshold() {
        let mut s = summary(SessionType::OneOnOne);
        s.participants = vec!["Zed".to_string()];
        let config = MatchConfig::default();
        let center = window_center_ms(&s);
        // Distant time, unrelated title, disjoint participants
        let pool_vec = vec![meeting(
            "m1",
            "Quarterly All Hands",
            "Eve, Mallory",
            center + 34 * 3600 * 1000,
        )];
        let pool = generate_candidates(&s, &pool_vec, &config);
        let decision = rank_candidates(&s, &pool, &config);

        assert!(decision.confident_match().is_none());
        assert_eq!(decision.ranked().len(), 1);
    }

    #[test]
    fn test_monotone_in_participant_overlap() {
        let s = summary(SessionType::OneOnOne);
        let config = MatchConfig::default();
        let center = window_center_ms(&s);

        let low = meeting("m1", "Planning", "Alice, Carol", center);
        let high = meeting("m2", "Planning", "Alice, Bob", center);

        let c_low = score_candidate(&s, &low, center, config.half_window_ms(), &config);
        let c_high = score_candidate(&s, &high, center, config.half_window_ms(), &config);
        assert!(c_high.sub_scores.participant > c_low.sub_scores.participant);
        assert!(c_high.score > c_low.score);
    }

    #[test]
    fn test_monotone_in_time_proximity() {
        let s = summary(SessionType::OneOnOne);
        let config = MatchConfig::default();
        let center = window_center_ms(&s);

        let near = meeting("m1", "Planning", "Alice, Bob", center + 3_600_000);
        let far = meeting("m2", "Planning", "Alice, Bob", center + 20 * 3_600_000);

        let c_near = score_candidate(&s, &near, center, config.half_window_ms(), &config);
        let c_far = score_candidate(&s, &far, center, config.half_window_ms(), &config);
        assert!(c_near.score > c_far.score);
    }

    #[test]
    fn test_deterministic_tiebreak_by_id() {
        let s = summary(SessionType::OneOnOne);
        let config = MatchConfig::default();
        let center = window_center_ms(&s);

        // Identical meetings apart from id: tie broken lexicographically
        let pool_vec = vec![
            meeting("mb", "Alice/Bob Weekly", "Alice, Bob", center),
            meeting("ma", "Alice/Bob Weekly", "Alice, Bob", center),
        ];
        let pool = generate_candidates(&s, &pool_vec, &config);
        let first = rank_candidates(&s, &pool, &config);
        assert_eq!(first.ranked()[0].meeting_id, "ma");

        // identical across repeated runs
        let second = rank_candidates(&s, &pool, &config);
        let ids: Vec<_> = second.ranked().iter().map(|c| c.meeting_id.clone()).collect();
        assert_eq!(ids, vec!["ma", "mb"]);
    }

    #[test]
    fn test_missing_timestamp_degrades_not_aborts() {
        let s = summary(SessionType::OneOnOne);
        let config = MatchConfig::default();
        let center = window_center_ms(&s);

        let mut m = meeting("m1", "Alice/Bob Weekly", "Alice, Bob", center);
        m.start_ms = None;
        m.end_ms = None;
        let c = score_candidate(&s, &m, center, config.half_window_ms(), &config);
        assert_eq!(c.sub_scores.time, 0.0);
        assert!(c.reason.contains("degraded"));
        assert!(c.score > 0.0);
    }

    #[test]
    fn test_snippet_contained_scores_full() {
        let mut s = summary(SessionType::ExternalSync);
        s.transcript_snippet = Some("talked about the roadmap".to_string());
        let config = MatchConfig::default();
        let center = window_center_ms(&s);
        let m = meeting("m1", "Partner call", "Alice, Bob", center);
        let c = score_candidate(&s, &m, center, config.half_window_ms(), &config);
        assert_eq!(c.sub_scores.snippet, 1.0);
    }
}
