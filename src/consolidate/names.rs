use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::MatchConfig;
use crate::models::SpeakerBlock;
use crate::similarity::normalize_person;

/// The speaker identity that most frequently carries a local source tag,
/// i.e. the local microphone. This anchors the configured canonical name
/// to exactly one diarization cluster.
pub fn local_speaker_id(blocks: &[SpeakerBlock], config: &MatchConfig) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for b in blocks {
        if let Some(source) = &b.source {
            if config.is_local_source(source) {
                *counts.entry(b.speaker_id.as_str()).or_default() += 1;
            }
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(id, _)| id.to_string())
}

/// Assign a display name to every canonical speaker identity.
///
/// Priority follows the original attribution rules: the local-anchored
/// cluster gets the canonical user name, remaining identities take the
/// known-name hints in first-appearance order, and anything left over
/// becomes "Speaker N".
pub fn assign_display_names(
    blocks: &[SpeakerBlock],
    known_names: &[String],
    config: &MatchConfig,
) -> BTreeMap<String, String> {
    let mut mapping = BTreeMap::new();
    let mut used: HashSet<String> = HashSet::new();

    if let Some(me) = local_speaker_id(blocks, config) {
        mapping.insert(me, config.canonical_name.clone());
        used.insert(normalize_person(&config.canonical_name));
    }

    let hints: Vec<&String> = known_names
        .iter()
        .filter(|n| !config.is_self(n))
        .collect();
    let mut next_hint = 0usize;
    let mut anonymous = 0usize;

    // First-appearance order over the block sequence
    let mut seen: HashSet<&str> = HashSet::new();
    for b in blocks {
        if !seen.insert(b.speaker_id.as_str()) {
            continue;
        }
        if mapping.contains_key(&b.speaker_id) {
            continue;
        }

        while next_hint < hints.len() && used.contains(&normalize_person(hints[next_hint])) {
            next_hint += 1;
        }
        let name = if next_hint < hints.len() {
            let hint = hints[next_hint].clone();
            next_hint += 1;
            hint
        } else {
            anonymous += 1;
            format!("Speaker {anonymous}")
        };
        used.insert(normalize_person(&name));
        mapping.insert(b.speaker_id.clone(), name);
    }

    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, source: Option<&str>) -> SpeakerBlock {
        SpeakerBlock {
            speaker_id: id.to_string(),
            text: "something was said".to_string(),
            start_ms: None,
            end_ms: None,
            source: source.map(|s| s.to_string()),
        }
    }

    fn config() -> MatchConfig {
        MatchConfig {
            canonical_name: "Alice Smith".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_local_anchor_most_frequent() {
        let blocks = vec![
            block("1", Some("mic")),
            block("2", Some("remote")),
            block("1", Some("mic")),
            block("2", Some("mic")),
        ];
        assert_eq!(local_speaker_id(&blocks, &config()), Some("1".to_string()));
    }

    #[test]
    fn test_no_local_sources() {
        let blocks = vec![block("1", Some("remote")), block("2", None)];
        assert_eq!(local_speaker_id(&blocks, &config()), None);
    }

    #[test]
    fn test_display_names_anchor_then_hints() {
        let blocks = vec![
            block("2", Some("remote")),
            block("1", Some("mic")),
            block("3", Some("remote")),
        ];
        let hints = vec!["Alice".to_string(), "Bob".to_string()];
        let names = assign_display_names(&blocks, &hints, &config());

        // "1" is the local anchor; "Alice" hint resolves to self and is
        // skipped, so "2" takes "Bob" and "3" falls back to Speaker 1
        assert_eq!(names["1"], "Alice Smith");
        assert_eq!(names["2"], "Bob");
        assert_eq!(names["3"], "Speaker 1");
    }

    #[test]
    fn test_display_names_without_anchor() {
        let blocks = vec![block("a", None), block("b", None)];
        let hints = vec!["Bob".to_string(), "Carol".to_string()];
        let names = assign_display_names(&blocks, &hints, &config());
        assert_eq!(names["a"], "Bob");
        assert_eq!(names["b"], "Carol");
    }
}
