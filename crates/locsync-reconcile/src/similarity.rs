//! Shared similarity metric: char-level difflib-style ratio, the same
//! measure the memory matcher ranks suggestions with. Context overlap is a
//! separate secondary signal, never folded into the source score: the
//! eligibility threshold and the greedy ranking must agree on one quantity.

use locsync_core::Context;
use similar::TextDiff;
use std::collections::HashSet;

/// Normalized source-text similarity in 0..=1 (char-level diff ratio,
/// `2 * matching / (len_a + len_b)`).
pub fn source_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    TextDiff::from_chars(a, b).ratio() as f64
}

/// Token-overlap (Jaccard) ratio of two context windows. Two empty windows
/// compare as identical; a single empty window is treated as unknown rather
/// than contradictory.
pub fn context_similarity(a: &Context, b: &Context) -> f64 {
    let ta: HashSet<String> = a.tokens().into_iter().collect();
    let tb: HashSet<String> = b.tokens().into_iter().collect();
    match (ta.is_empty(), tb.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => {
            let inter = ta.intersection(&tb).count();
            let union = ta.union(&tb).count();
            inter as f64 / union as f64
        }
    }
}
