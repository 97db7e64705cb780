pub mod disjoint_set;
pub mod names;

pub use names::assign_display_names;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::MatchConfig;
use crate::models::{SessionType, SpeakerBlock};
use crate::similarity::{jaccard, token_ratio};

use disjoint_set::DisjointSet;

/// Relative weights of the three pairwise signals.
const TEXT_WEIGHT: f64 = 0.4;
const SOURCE_WEIGHT: f64 = 0.3;
const TURN_WEIGHT: f64 = 0.3;

/// Meeting context handed to the consolidator alongside the raw blocks.
#[derive(Debug, Clone, Default)]
pub struct MeetingContext {
    pub title: Option<String>,
    pub session_type: SessionType,
    /// Participant names known from the summary or the source
    pub known_names: Vec<String>,
}

/// Pairwise similarity between two raw speaker identities, kept for
/// debug inspection.
#[derive(Debug, Clone, Serialize)]
pub struct PairScore {
    pub a: String,
    pub b: String,
    pub text_style: f64,
    pub source_agreement: f64,
    pub turn_taking: f64,
    pub combined: f64,
    pub merged: bool,
}

/// Result of consolidating one transcript's speaker identities.
#[derive(Debug)]
pub struct ConsolidationResult {
    /// Blocks with canonicalized speaker identities
    pub blocks: Vec<SpeakerBlock>,
    /// Raw identity -> canonical identity, for every observed identity
    pub mapping: BTreeMap<String, String>,
    /// Every pair considered and its sub-scores
    pub pair_scores: Vec<PairScore>,
    /// Number of identities absorbed into another group
    pub merges: usize,
    /// Threshold actually applied (lowered in two-party context)
    pub effective_threshold: f64,
}

/// Merge spuriously duplicated diarization identities in one transcript.
///
/// Every pair of distinct identities gets a combined similarity from text
/// style, source-tag agreement, and turn-taking pattern; pairs at or above
/// the threshold merge through a disjoint set, and each group is rewritten
/// to its most frequent member. Idempotent: re-running over the rewritten
/// blocks finds the same partition and performs no further merges.
pub fn consolidate_speakers(
    blocks: &[SpeakerBlock],
    context: &MeetingContext,
    config: &MatchConfig,
) -> ConsolidationResult {
    let mut by_speaker: HashMap<String, Vec<&SpeakerBlock>> = HashMap::new();
    for b in blocks {
        if b.text.trim().is_empty() {
            continue;
        }
        by_speaker.entry(b.speaker_id.clone()).or_default().push(b);
    }

    let mut ids: Vec<String> = by_speaker.keys().cloned().collect();
    ids.sort();

    let effective_threshold = if is_two_party(context, config) {
        config.two_party_threshold
    } else {
        config.speaker_similarity_threshold
    };

    let mut ds = DisjointSet::new();
    for id in &ids {
        ds.insert(id);
    }

    let runs = speaker_runs(blocks);
    let mut pair_scores = Vec::new();

    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let a = &ids[i];
            let b = &ids[j];
            let text_style = text_style_similarity(
                &by_speaker[a],
                &by_speaker[b],
                config.text_sample_blocks,
            );
            let source_agreement = source_agreement(&by_speaker[a], &by_speaker[b]);
            let turn_taking = turn_taking_score(&runs, a, b);
            let combined = TEXT_WEIGHT * text_style
                + SOURCE_WEIGHT * source_agreement
                + TURN_WEIGHT * turn_taking;
            let merged = combined >= effective_threshold;

            if merged {
                ds.union(a, b);
                debug!(a = %a, b = %b, combined, "merging speaker identities");
            }
            pair_scores.push(PairScore {
                a: a.clone(),
                b: b.clone(),
                text_style,
                source_agreement,
                turn_taking,
                combined,
                merged,
            });
        }
    }

    // Canonical representative per group: most frequent raw identity,
    // ties to the lexicographically smaller id.
    let mut canonical_of_root: HashMap<String, String> = HashMap::new();
    for (root, members) in ds.groups() {
        let canonical = members
            .iter()
            .max_by(|x, y| {
                let cx = by_speaker.get(*x).map_or(0, |v| v.len());
                let cy = by_speaker.get(*y).map_or(0, |v| v.len());
                cx.cmp(&cy).then_with(|| y.cmp(x))
            })
            .cloned()
            .unwrap_or_else(|| root.clone());
        canonical_of_root.insert(root, canonical);
    }

    let mut mapping = BTreeMap::new();
    let mut merges = 0;
    for id in &ids {
        let canonical = canonical_of_root[&ds.find(id)].clone();
        if canonical != *id {
            merges += 1;
        }
        mapping.insert(id.clone(), canonical);
    }

    let rewritten: Vec<SpeakerBlock> = blocks
        .iter()
        .map(|b| {
            let mut out = b.clone();
            if let Some(canonical) = mapping.get(&b.speaker_id) {
                out.speaker_id = canonical.clone();
            }
            out
        })
        .collect();

    if merges > 0 {
        info!(
            identities = ids.len(),
            merges, effective_threshold, "consolidated speaker identities"
        );
    }

    ConsolidationResult {
        blocks: rewritten,
        mapping,
        pair_scores,
        merges,
        effective_threshold,
    }
}

/// Whether the meeting context implies exactly two true speakers, which
/// justifies more aggressive merging.
fn is_two_party(context: &MeetingContext, config: &MatchConfig) -> bool {
    if context.session_type == SessionType::OneOnOne {
        return true;
    }
    if let Some(title) = &context.title {
        let t = title.to_lowercase();
        if t.contains("1:1") || t.contains("1-1") || t.contains("1 on 1") {
            return true;
        }
    }
    let others = context
        .known_names
        .iter()
        .filter(|n| !config.is_self(n))
        .count();
    !context.known_names.is_empty() && others == 1
}

/// Average pairwise sequence-similarity ratio across sampled block texts.
fn text_style_similarity(a: &[&SpeakerBlock], b: &[&SpeakerBlock], sample: usize) -> f64 {
    let texts_a: Vec<String> = a
        .iter()
        .take(sample)
        .map(|blk| blk.text.to_lowercase())
        .collect();
    let texts_b: Vec<String> = b
        .iter()
        .take(sample)
        .map(|blk| blk.text.to_lowercase())
        .collect();
    if texts_a.is_empty() || texts_b.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for ta in &texts_a {
        for tb in &texts_b {
            total += token_ratio(ta, tb);
            pairs += 1;
        }
    }
    total / pairs as f64
}

/// Jaccard overlap of the source tags observed for two identities.
fn source_agreement(a: &[&SpeakerBlock], b: &[&SpeakerBlock]) -> f64 {
    let tags = |blocks: &[&SpeakerBlock]| -> HashSet<String> {
        blocks
            .iter()
            .filter_map(|blk| blk.source.as_ref())
            .map(|s| s.to_lowercase())
            .collect()
    };
    jaccard(&tags(a), &tags(b))
}

/// Collapse the block sequence into runs of consecutive identical
/// speakers.
fn speaker_runs(blocks: &[SpeakerBlock]) -> Vec<String> {
    let mut runs = Vec::new();
    for b in blocks {
        if b.text.trim().is_empty() {
            continue;
        }
        if runs.last() != Some(&b.speaker_id) {
            runs.push(b.speaker_id.clone());
        }
    }
    runs
}

/// Turn-taking signal: identities that never sit in adjacent runs are
/// likely one person misdetected across segments (score 1.0); identities
/// that alternate at every opportunity are likely distinct (score 0.0).
/// Opportunities are bounded by the two identities' run counts.
fn turn_taking_score(runs: &[String], a: &str, b: &str) -> f64 {
    let runs_a = runs.iter().filter(|r| r.as_str() == a).count();
    let runs_b = runs.iter().filter(|r| r.as_str() == b).count();
    if runs_a == 0 || runs_b == 0 {
        return 1.0;
    }

    let mut alternations = 0usize;
    for pair in runs.windows(2) {
        let is_pair = (pair[0] == a && pair[1] == b) || (pair[0] == b && pair[1] == a);
        if is_pair {
            alternations += 1;
        }
    }
    let opportunities = (runs_a + runs_b - 1).max(1);
    1.0 - (alternations as f64 / opportunities as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, text: &str, source: Option<&str>) -> SpeakerBlock {
        SpeakerBlock {
            speaker_id: id.to_string(),
            text: text.to_string(),
            start_ms: None,
            end_ms: None,
            source: source.map(|s| s.to_string()),
        }
    }

    fn two_party_context() -> MeetingContext {
        MeetingContext {
            title: Some("1:1 with Bob".to_string()),
            session_type: SessionType::OneOnOne,
            known_names: vec![],
        }
    }

    /// Three raw identities where 2 is a misdetected continuation of 1:
    /// same source, similar phrasing, never adjacent to 1. Identity 3
    /// alternates against both and stays separate.
    fn split_speaker_blocks() -> Vec<SpeakerBlock> {
        vec![
            block("1", "so the plan for the quarter is growth", Some("mic")),
            block("3", "right, what about the budget side", Some("remote")),
            block("2", "so the plan for the quarter is hiring", Some("mic")),
            block("3", "okay that makes sense to me", Some("remote")),
            block("2", "so the plan is basically more hiring", Some("mic")),
            block("3", "got it, thanks for walking me through", Some("remote")),
            block("1", "so the plan for next quarter is growth", Some("mic")),
        ]
    }

    #[test]
    fn test_two_party_collapses_to_two_identities() {
        let config = MatchConfig::default();
        let result =
            consolidate_speakers(&split_speaker_blocks(), &two_party_context(), &config);

        assert_eq!(result.mapping["1"], result.mapping["2"]);
        assert_ne!(result.mapping["1"], result.mapping["3"]);

        let canonical: HashSet<&String> = result.mapping.values().collect();
        assert_eq!(canonical.len(), 2);
        // equal block counts: tie breaks to the lexicographically smaller id
        assert_eq!(result.mapping["1"], "1");
        assert_eq!(result.mapping["2"], "1");
    }

    #[test]
    fn test_groups_partition_transitively() {
        let config = MatchConfig::default();
        // 1~2 and 2~4: same source and near-identical phrasing
        let blocks = vec![
            block("1", "let's review the incident timeline now", Some("mic")),
            block("3", "sure go ahead", Some("remote")),
            block("2", "let's review the incident timeline again", Some("mic")),
            block("3", "I see it", Some("remote")),
            block("4", "let's review the incident timeline once more", Some("mic")),
        ];
        let result = consolidate_speakers(&blocks, &two_party_context(), &config);

        let c1 = &result.mapping["1"];
        assert_eq!(c1, &result.mapping["2"]);
        assert_eq!(c1, &result.mapping["4"]);
        assert_ne!(c1, &result.mapping["3"]);
    }

    #[test]
    fn test_idempotent_rerun() {
        let config = MatchConfig::default();
        let context = two_party_context();
        let first = consolidate_speakers(&split_speaker_blocks(), &context, &config);
        assert!(first.merges > 0);

        let second = consolidate_speakers(&first.blocks, &context, &config);
        assert_eq!(second.merges, 0);
        assert_eq!(second.blocks.len(), first.blocks.len());
        for (a, b) in first.blocks.iter().zip(second.blocks.iter()) {
            assert_eq!(a.speaker_id, b.speaker_id);
        }
    }

    #[test]
    fn test_alternating_speakers_not_merged() {
        let config = MatchConfig::default();
        // Two identities trading turns with different sources
        let blocks = vec![
            block("1", "how was the demo received", Some("mic")),
            block("2", "pretty well overall I think", Some("remote")),
            block("1", "any objections from their side", Some("mic")),
            block("2", "only about the timeline", Some("remote")),
        ];
        let context = MeetingContext {
            title: Some("Partner debrief".to_string()),
            session_type: SessionType::ExternalSync,
            known_names: vec![],
        };
        let result = consolidate_speakers(&blocks, &context, &config);
        assert_eq!(result.merges, 0);
        assert_eq!(result.effective_threshold, config.speaker_similarity_threshold);
    }

    #[test]
    fn test_turn_taking_score() {
        let runs: Vec<String> = ["1", "3", "2", "3", "1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        // 1 and 2 never adjacent
        assert_eq!(turn_taking_score(&runs, "1", "2"), 1.0);
        // 1 and 3 alternate twice in three opportunities
        assert!((turn_taking_score(&runs, "1", "3") - 1.0 / 3.0).abs() < 1e-9);
        // fully alternating pair scores zero
        let pingpong: Vec<String> = ["a", "b", "a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(turn_taking_score(&pingpong, "a", "b"), 0.0);
        // absent identities are vacuously never adjacent
        assert_eq!(turn_taking_score(&runs, "8", "9"), 1.0);
    }

    #[test]
    fn test_pair_scores_exposed_for_debug() {
        let config = MatchConfig::default();
        let result =
            consolidate_speakers(&split_speaker_blocks(), &two_party_context(), &config);
        // 3 identities -> 3 pairs
        assert_eq!(result.pair_scores.len(), 3);
        for p in &result.pair_scores {
            assert!(p.combined >= 0.0 && p.combined <= 1.0);
            assert_eq!(p.merged, p.combined >= result.effective_threshold);
        }
    }

    #[test]
    fn test_two_party_from_known_names() {
        let config = MatchConfig {
            canonical_name: "Alice Smith".to_string(),
            ..Default::default()
        };
        let context = MeetingContext {
            title: Some("Weekly".to_string()),
            session_type: SessionType::Other,
            known_names: vec!["Alice".to_string(), "Bob".to_string()],
        };
        assert!(is_two_party(&context, &config));

        let three_way = MeetingContext {
            known_names: vec!["Alice".to_string(), "Bob".to_string(), "Carol".to_string()],
            ..context
        };
        assert!(!is_two_party(&three_way, &config));
    }
}
