pub mod candidates;
pub mod scoring;

pub use candidates::{generate_candidates, window_center_ms, CandidatePool};
pub use scoring::{rank_candidates, score_candidate, MatchDecision};
