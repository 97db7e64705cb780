use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConcordError;
use crate::models::SessionType;

/// Weights applied to the four matching sub-scores. Kept normalized so
/// composite scores stay in [0,1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightProfile {
    pub participant: f64,
    pub title: f64,
    pub time: f64,
    pub snippet: f64,
}

impl WeightProfile {
    pub fn balanced() -> Self {
        Self {
            participant: 0.35,
            title: 0.25,
            time: 0.15,
            snippet: 0.25,
        }
    }
}

/// Weight vector plus acceptance threshold for one session type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProfile {
    pub weights: WeightProfile,
    pub threshold: f64,
}

/// Immutable matching configuration, passed explicitly into the candidate
/// generator, scoring engine, and speaker consolidator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// The local user's reference name
    pub canonical_name: String,
    /// Informal variants that resolve to the canonical name
    pub aliases: HashSet<String>,
    /// Symmetric candidate window around the summary's date
    pub window_hours: i64,
    /// Per-session-type weight/threshold profiles; unlisted types fall
    /// back to the `default` entry
    pub profiles: BTreeMap<String, SessionProfile>,
    /// Pair similarity at or above this merges two speaker identities
    pub speaker_similarity_threshold: f64,
    /// Lowered threshold when context implies a two-party conversation
    pub two_party_threshold: f64,
    /// Source tags that mean the local microphone
    pub local_sources: HashSet<String>,
    /// How many blocks per speaker to sample for text-style similarity
    pub text_sample_blocks: usize,
    /// How many leading blocks form the snippet-match prefix
    pub snippet_prefix_blocks: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            SessionType::OneOnOne.as_str().to_string(),
            SessionProfile {
                weights: WeightProfile {
                    participant: 0.45,
                    title: 0.10,
                    time: 0.25,
                    snippet: 0.20,
                },
                threshold: 0.45,
            },
        );
        profiles.insert(
            SessionType::InternalSync.as_str().to_string(),
            SessionProfile {
                weights: WeightProfile {
                    participant: 0.35,
                    title: 0.20,
                    time: 0.15,
                    snippet: 0.30,
                },
                threshold: 0.42,
            },
        );
        profiles.insert(
            SessionType::ExternalSync.as_str().to_string(),
            SessionProfile {
                weights: WeightProfile {
                    participant: 0.25,
                    title: 0.30,
                    time: 0.10,
                    snippet: 0.35,
                },
                threshold: 0.35,
            },
        );
        profiles.insert(
            SessionType::NoteToSelf.as_str().to_string(),
            SessionProfile {
                weights: WeightProfile {
                    participant: 0.30,
                    title: 0.10,
                    time: 0.35,
                    snippet: 0.25,
                },
                threshold: 0.35,
            },
        );
        profiles.insert(
            SessionType::Other.as_str().to_string(),
            SessionProfile {
                weights: WeightProfile::balanced(),
                threshold: 0.40,
            },
        );

        Self {
            canonical_name: "Me".to_string(),
            aliases: ["me", "myself"].iter().map(|s| s.to_string()).collect(),
            window_hours: 36,
            profiles,
            speaker_similarity_threshold: 0.4,
            two_party_threshold: 0.3,
            local_sources: ["mic", "local", "local-user"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            text_sample_blocks: 5,
            snippet_prefix_blocks: 10,
        }
    }
}

impl MatchConfig {
    /// Load a configuration from a JSON file. Missing fields take their
    /// defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConcordError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConcordError::Store {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ConcordError::Decode {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Profile for a session type, falling back to the balanced default.
    pub fn profile(&self, session_type: SessionType) -> SessionProfile {
        self.profiles
            .get(session_type.as_str())
            .or_else(|| self.profiles.get(SessionType::Other.as_str()))
            .cloned()
            .unwrap_or(SessionProfile {
                weights: WeightProfile::balanced(),
                threshold: 0.40,
            })
    }

    /// Whether a name resolves to the local user.
    pub fn is_self(&self, name: &str) -> bool {
        let n = crate::similarity::normalize_person(name);
        if n.is_empty() {
            return false;
        }
        if self.aliases.iter().any(|a| a.to_lowercase() == n) {
            return true;
        }
        let canonical: HashSet<String> = crate::similarity::normalize_person(&self.canonical_name)
            .split_whitespace()
            .map(|t| t.to_string())
            .collect();
        n.split_whitespace().any(|t| canonical.contains(t))
    }

    /// Resolve a raw name to canonical form: aliases collapse to the
    /// canonical name, everything else is normalized.
    pub fn resolve_name(&self, name: &str) -> String {
        if self.is_self(name) {
            crate::similarity::normalize_person(&self.canonical_name)
        } else {
            crate::similarity::normalize_person(name)
        }
    }

    /// Whether a source tag denotes the local microphone.
    pub fn is_local_source(&self, source: &str) -> bool {
        self.local_sources.contains(&source.to_lowercase())
    }

    pub fn half_window_ms(&self) -> i64 {
        self.window_hours * 3600 * 1000
    }
}
