use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;

/// One speaker-labeled stretch of transcribed text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerBlock {
    /// Raw diarization identity; may be spuriously duplicated across the
    /// transcript
    pub speaker_id: String,
    pub text: String,
    /// Start offset in milliseconds
    #[serde(default)]
    pub start_ms: Option<i64>,
    /// End offset in milliseconds
    #[serde(default)]
    pub end_ms: Option<i64>,
    /// Audio source tag, e.g. "mic" for the local microphone
    #[serde(default)]
    pub source: Option<String>,
}

/// A transcript-bearing meeting record, read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub id: String,
    pub title: String,
    /// Free-form participant string from the source; unreliable
    #[serde(default)]
    pub participants: Option<String>,
    /// Start timestamp in epoch milliseconds
    #[serde(default)]
    pub start_ms: Option<i64>,
    /// End timestamp in epoch milliseconds
    #[serde(default)]
    pub end_ms: Option<i64>,
    #[serde(default)]
    pub blocks: Vec<SpeakerBlock>,
}

impl MeetingRecord {
    pub fn has_transcript(&self) -> bool {
        self.blocks.iter().any(|b| !b.text.trim().is_empty())
    }

    /// Midpoint of the recording, preferring the start/end average.
    pub fn midpoint_ms(&self) -> Option<i64> {
        match (self.start_ms, self.end_ms) {
            (Some(s), Some(e)) if e >= s => Some((s + e) / 2),
            (Some(s), _) => Some(s),
            (_, Some(e)) => Some(e),
            _ => None,
        }
    }

    /// Split the free-form participants string into normalized names,
    /// resolving aliases to the canonical identity. Splits on commas,
    /// ampersands, and the word "and"; drops duplicates.
    pub fn participant_names(&self, config: &MatchConfig) -> Vec<String> {
        let raw = match &self.participants {
            Some(p) => p,
            None => return Vec::new(),
        };
        let lowered = raw.to_lowercase().replace(" and ", ",").replace('&', ",");
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for part in lowered.split(',') {
            let name = config.resolve_name(part);
            if name.is_empty() {
                continue;
            }
            if seen.insert(name.clone()) {
                out.push(name);
            }
        }
        out
    }

    /// Concatenated text of the first `limit` blocks, whitespace-collapsed.
    pub fn transcript_prefix(&self, limit: usize) -> String {
        let joined: Vec<&str> = self
            .blocks
            .iter()
            .take(limit)
            .map(|b| b.text.trim())
            .filter(|t| !t.is_empty())
            .collect();
        joined
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Distinct raw speaker identities, in first-appearance order.
    pub fn speaker_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for b in &self.blocks {
            if seen.insert(b.speaker_id.clone()) {
                out.push(b.speaker_id.clone());
            }
        }
        out
    }
}

/// Normalize an explicit set of names through the config.
pub fn normalize_name_set(
    names: &[String],
    config: &MatchConfig,
) -> std::collections::HashSet<String> {
    names
        .iter()
        .map(|n| config.resolve_name(n))
        .filter(|n| !n.is_empty())
        .collect()
}
