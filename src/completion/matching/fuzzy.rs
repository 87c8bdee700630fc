//! Approximate matching
//!
//! Similarity is the normalized Damerau-Levenshtein score between the query and the
//! head of each candidate (value or alias) whose length is within one character of the
//! query, taking the best. Only the bucket of the query's first character is scored.

use std::cmp::Ordering;

use super::prefix::prefix_hits;
use super::{MatchOptions, adjust_case, sources, starts_with};
use crate::completion::index::IndexedWords;
use crate::completion::word::Word;

/// Similarity between `query` and the best-fitting head of `target`, case-folded
pub fn similarity(query: &str, target: &str) -> f64 {
    let query = query.to_lowercase();
    let target = target.to_lowercase();
    let query_len = query.chars().count();
    let target_len = target.chars().count();
    if query_len == 0 {
        return 0.0;
    }

    let shortest = query_len.saturating_sub(1).max(1).min(target_len);
    let longest = (query_len + 1).min(target_len);
    (shortest..=longest)
        .map(|len| {
            let head: String = target.chars().take(len).collect();
            strsim::normalized_damerau_levenshtein(&query, &head)
        })
        .fold(0.0, f64::max)
}

fn score(word: &Word, query: &str) -> f64 {
    word.match_targets()
        .map(|target| similarity(query, target))
        .fold(0.0, f64::max)
}

/// Approximate candidates that are not already prefix hits, best score first per source
pub(crate) fn fuzzy_candidates(
    indexed: &IndexedWords,
    query: &str,
    limit: usize,
    options: &MatchOptions,
) -> Vec<Word> {
    let Some(first) = query.chars().next() else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for source in sources(indexed, options) {
        let mut scored: Vec<(f64, &Word)> = source
            .bucket(first)
            .filter(|word| !starts_with(word, query, options.case_sensitive))
            .map(|word| (score(word, query), word))
            .filter(|(score, _)| *score >= options.fuzzy.min_match_score)
            .collect();
        // Stable: equal scores keep scan order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        results.extend(scored.into_iter().take(limit).map(|(_, word)| {
            let mut word = word.clone();
            word.fuzzy_matched = true;
            word
        }));
    }
    results
}

/// Prefix hits first, then approximate candidates tagged `fuzzy_matched`
pub fn fuzzy_match(
    indexed: &IndexedWords,
    query: &str,
    limit: usize,
    options: &MatchOptions,
) -> Vec<Word> {
    if query.is_empty() {
        return Vec::new();
    }

    let mut results = Vec::new();
    for source in sources(indexed, options) {
        results.extend(
            prefix_hits(source, query, options.case_sensitive)
                .take(limit)
                .cloned(),
        );
    }
    results.extend(fuzzy_candidates(indexed, query, limit, options));

    results.into_iter().map(|word| adjust_case(word, query)).collect()
}
