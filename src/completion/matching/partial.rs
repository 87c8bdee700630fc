use super::{MatchOptions, adjust_case, contains, fuzzy, sources, starts_with};
use crate::completion::index::IndexedWords;
use crate::completion::word::Word;

/// Words whose value or alias contains `query` anywhere
///
/// Every word of every consulted source is scanned, not just one bucket. Prefix hits
/// are moved ahead of mid-word hits so the result always covers what `prefix_match`
/// returns for the same query and limit.
pub fn partial_match(
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
        let (mut hits, infix): (Vec<&Word>, Vec<&Word>) = source
            .words()
            .iter()
            .filter(|word| contains(word, query, options.case_sensitive))
            .partition(|word| starts_with(word, query, options.case_sensitive));
        hits.extend(infix);
        results.extend(hits.into_iter().take(limit).cloned());
    }

    if options.fuzzy_tail {
        results.extend(fuzzy::fuzzy_candidates(indexed, query, limit, options));
    }

    results.into_iter().map(|word| adjust_case(word, query)).collect()
}
