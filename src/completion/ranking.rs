//! Merging and ranking of completion results
//!
//! Candidates arrive concatenated per query token, each token's list already in its
//! match strategy's order. Ranking (in order):
//! 1. Exact before fuzzy - `fuzzy_matched = false` sorts first, stable otherwise
//! 2. Deduplicate by `(value, source)`, keeping the first occurrence
//! 3. Selection history boost for the query's context, if any
//! 4. Truncate to the configured maximum

use rustc_hash::FxHashSet;

use super::history::SelectionHistoryStore;
use super::word::{SourceType, Word};

/// Criteria for ranking completion results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingCriteria {
    /// Maximum results to return (default: 5)
    pub max_results: usize,
}

impl Default for RankingCriteria {
    fn default() -> Self {
        Self { max_results: 5 }
    }
}

/// History lookup applied during ranking
#[derive(Debug, Clone, Copy)]
pub struct HistoryBoost<'a> {
    pub store: &'a SelectionHistoryStore,
    pub context: &'a str,
}

/// Rank merged candidates according to the given criteria
pub fn rank_completions(
    mut candidates: Vec<Word>,
    history: Option<HistoryBoost<'_>>,
    criteria: &RankingCriteria,
) -> Vec<Word> {
    candidates.sort_by_key(|word| word.fuzzy_matched);

    let mut seen: FxHashSet<(String, SourceType)> = FxHashSet::default();
    candidates.retain(|word| seen.insert((word.value.clone(), word.source_type())));

    if let Some(HistoryBoost { store, context }) = history {
        candidates = store.boost(candidates, context);
    }

    candidates.truncate(criteria.max_results);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::word::WordPayload;

    fn word(value: &str, payload: WordPayload, fuzzy: bool) -> Word {
        let mut word = Word::new(value, payload);
        word.fuzzy_matched = fuzzy;
        word
    }

    fn collection() -> WordPayload {
        WordPayload::Collection {
            created_path: "notes/a.md".to_string(),
        }
    }

    fn values(words: &[Word]) -> Vec<&str> {
        words.iter().map(|w| w.value.as_str()).collect()
    }

    #[test]
    fn test_exact_before_fuzzy() {
        let candidates = vec![
            word("aple", WordPayload::CurrentDocument, true),
            word("apple", WordPayload::CurrentDocument, false),
            word("ample", WordPayload::CurrentDocument, true),
            word("apply", WordPayload::CurrentDocument, false),
        ];
        let ranked = rank_completions(candidates, None, &RankingCriteria::default());
        assert_eq!(values(&ranked), vec!["apple", "apply", "aple", "ample"]);
    }

    #[test]
    fn test_dedup_by_value_and_source() {
        let candidates = vec![
            word("apple", WordPayload::CurrentDocument, false),
            word("apple", collection(), false),
            word("apple", WordPayload::CurrentDocument, false),
        ];
        let ranked = rank_completions(candidates, None, &RankingCriteria::default());
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].source_type(), SourceType::CurrentDocument);
        assert_eq!(ranked[1].source_type(), SourceType::Collection);
    }

    #[test]
    fn test_dedup_keeps_exact_over_fuzzy_duplicate() {
        let candidates = vec![
            word("apple", WordPayload::CurrentDocument, true),
            word("apple", WordPayload::CurrentDocument, false),
        ];
        let ranked = rank_completions(candidates, None, &RankingCriteria::default());
        assert_eq!(ranked.len(), 1);
        assert!(!ranked[0].fuzzy_matched);
    }

    #[test]
    fn test_history_boost_then_truncate() {
        let mut store = SelectionHistoryStore::new(10);
        store.increment(&word("apt", WordPayload::CurrentDocument, false), "I like");

        let candidates = vec![
            word("apple", WordPayload::CurrentDocument, false),
            word("apply", WordPayload::CurrentDocument, false),
            word("apt", WordPayload::CurrentDocument, false),
        ];
        let history = HistoryBoost {
            store: &store,
            context: "I like",
        };
        let ranked = rank_completions(candidates, Some(history), &RankingCriteria { max_results: 2 });
        assert_eq!(values(&ranked), vec!["apt", "apple"]);
    }
}
