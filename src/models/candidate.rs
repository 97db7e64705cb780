use serde::{Deserialize, Serialize};

/// Per-signal sub-scores, each in [0,1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub participant: f64,
    pub title: f64,
    pub time: f64,
    pub snippet: f64,
}

/// A scored (pending summary, meeting record) pairing. Ephemeral:
/// regenerated on every reconciliation attempt, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub meeting_id: String,
    pub meeting_title: String,
    /// Weighted composite in [0,1]
    pub score: f64,
    pub sub_scores: SubScores,
    /// Absolute distance from the window center, used for tie-breaks
    pub time_offset_ms: i64,
    /// Human-readable explanation of the score
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_serializes_sub_scores() {
        let c = Candidate {
            meeting_id: "m1".to_string(),
            meeting_title: "Weekly".to_string(),
            score: 0.62,
            sub_scores: SubScores {
                participant: 1.0,
                title: 0.4,
                time: 0.9,
                snippet: 0.0,
            },
            time_offset_ms: 3_600_000,
            reason: "participant=1.00 title=0.40 time=0.90 snippet=0.00".to_string(),
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["sub_scores"]["participant"], 1.0);
        assert_eq!(json["meeting_id"], "m1");
    }
}
