//! Word-overlap ranking.
//!
//! Grounded on the teacher's `TranscriptIndex::search`
//! (`crates/sessions/src/search.rs`): tokenize to lowercase alphabetic
//! words, then score each candidate by the size of its token intersection
//! with the query. No embeddings, no external index — a good-enough
//! in-process ranking for the reference backend.

use std::collections::HashSet;

pub fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Intersection size between the query tokens and the candidate's tokens,
/// normalized by query length so a short query doesn't automatically lose
/// to a long one. Returns 0.0 when the query has no tokens.
pub fn score(query_tokens: &HashSet<String>, candidate: &str) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let candidate_tokens = tokenize(candidate);
    let overlap = query_tokens.intersection(&candidate_tokens).count();
    overlap as f64 / query_tokens.len() as f64
}
