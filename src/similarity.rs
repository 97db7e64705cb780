//! Scalar similarity primitives used by the scoring engine and the
//! speaker consolidator. Each function is pure so the combinators above
//! stay thin weighted sums over independently testable signals.

use std::collections::HashSet;

/// Sequence similarity ratio in [0,1] based on the longest common
/// subsequence: `2*lcs / (|a| + |b|)`. Operates on characters.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let lcs = lcs_length(&a_chars, &b_chars);

    2.0 * lcs as f64 / (a_chars.len() + b_chars.len()) as f64
}

/// Longest common subsequence length with a rolling single-row table.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Word-level sequence similarity ratio in [0,1]: LCS over whitespace
/// tokens. Less permissive than the character ratio on longer prose, so
/// it suits speaker text-style comparison.
pub fn token_ratio(a: &str, b: &str) -> f64 {
    let ta: Vec<&str> = a.split_whitespace().collect();
    let tb: Vec<&str> = b.split_whitespace().collect();
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let mut prev = vec![0usize; tb.len() + 1];
    let mut curr = vec![0usize; tb.len() + 1];
    for &wa in &ta {
        for (j, &wb) in tb.iter().enumerate() {
            curr[j + 1] = if wa == wb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs = prev[tb.len()];

    2.0 * lcs as f64 / (ta.len() + tb.len()) as f64
}

/// Jaccard overlap of two sets: |intersection| / |union|, 0.0 when both
/// sides are empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Linear decay score: 1.0 at zero offset, 0.0 at the window edge and
/// beyond. Monotonically non-increasing in the absolute offset.
pub fn time_decay(offset_ms: i64, half_window_ms: i64) -> f64 {
    if half_window_ms <= 0 {
        return 0.0;
    }
    let frac = offset_ms.unsigned_abs() as f64 / half_window_ms as f64;
    (1.0 - frac).max(0.0)
}

/// Fraction of `needle` covered by its longest common substring with
/// `hay`, in [0,1]. Used for graded snippet matching when the snippet is
/// not contained verbatim.
pub fn longest_substring_fraction(needle: &str, hay: &str) -> f64 {
    if needle.is_empty() || hay.is_empty() {
        return 0.0;
    }
    let n: Vec<char> = needle.chars().collect();
    let h: Vec<char> = hay.chars().collect();

    let mut prev = vec![0usize; h.len() + 1];
    let mut curr = vec![0usize; h.len() + 1];
    let mut best = 0usize;

    for &cn in &n {
        for (j, &ch) in h.iter().enumerate() {
            curr[j + 1] = if cn == ch { prev[j] + 1 } else { 0 };
            best = best.max(curr[j + 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
        curr.fill(0);
    }

    best as f64 / n.len() as f64
}

/// Normalize a title for comparison: lowercase, strip everything but
/// alphanumerics, collapse whitespace.
pub fn normalize_title(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a person name token: lowercase, strip parentheticals and
/// anything that is not a letter, apostrophe, or space.
pub fn normalize_person(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    let lowered = out.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphabetic() || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
