use super::{MatchOptions, adjust_case, fuzzy, sources, starts_with};
use crate::completion::index::{IndexSnapshot, IndexedWords};
use crate::completion::word::Word;

/// Prefix hits of one source, in bucket (scan) order
pub(crate) fn prefix_hits<'a>(
    source: &'a IndexSnapshot,
    query: &'a str,
    case_sensitive: bool,
) -> impl Iterator<Item = &'a Word> + 'a {
    query
        .chars()
        .next()
        .into_iter()
        .flat_map(move |first| source.bucket(first))
        .filter(move |word| starts_with(word, query, case_sensitive))
}

/// Words whose value or alias starts with `query`
///
/// Only the bucket keyed by the query's first character is scanned.
pub fn prefix_match(
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

    if options.fuzzy_tail {
        results.extend(fuzzy::fuzzy_candidates(indexed, query, limit, options));
    }

    results.into_iter().map(|word| adjust_case(word, query)).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_prefix_scan_order() {
        let indexed = indexed(&["apple", "banana", "apply", "apt"]);
        let words = prefix_match(&indexed, "ap", 5, &MatchOptions::default());
        assert_eq!(values(&words), vec!["apple", "apply", "apt"]);
    }

    #[test]
    fn test_prefix_limit_is_per_source() {
        let mut indexed = indexed(&["apple", "apply", "apt"]);
        indexed.custom_dictionary = Arc::new(IndexSnapshot::from_words(vec![
            dictionary_word("apex"),
            dictionary_word("april"),
        ]));
        let words = prefix_match(&indexed, "ap", 2, &MatchOptions::default());
        assert_eq!(values(&words), vec!["apple", "apply", "apex", "april"]);
    }

    #[test]
    fn test_prefix_case_sensitivity() {
        let indexed = indexed(&["Apple", "apply"]);
        let insensitive = prefix_match(&indexed, "ap", 5, &MatchOptions::default());
        assert_eq!(values(&insensitive), vec!["Apple", "apply"]);

        let options = MatchOptions {
            case_sensitive: true,
            ..MatchOptions::default()
        };
        let sensitive = prefix_match(&indexed, "ap", 5, &options);
        assert_eq!(values(&sensitive), vec!["apply"]);
    }

    #[test]
    fn test_prefix_matches_aliases() {
        let indexed = IndexedWords {
            current_document: Arc::new(IndexSnapshot::from_words(vec![
                doc_word("café").with_aliases(vec!["cafe".into()]),
            ])),
            ..IndexedWords::default()
        };
        let words = prefix_match(&indexed, "cafe", 5, &MatchOptions::default());
        assert_eq!(values(&words), vec!["café"]);
    }

    #[test]
    fn test_prefix_capitalises_document_words() {
        let indexed = indexed(&["apple"]);
        let words = prefix_match(&indexed, "Ap", 5, &MatchOptions::default());
        assert_eq!(values(&words), vec!["Apple"]);
    }

    #[test]
    fn test_prefix_empty_query() {
        let indexed = indexed(&["apple"]);
        assert!(prefix_match(&indexed, "", 5, &MatchOptions::default()).is_empty());
    }

    #[test]
    fn test_prefix_appends_fuzzy_candidates() {
        let indexed = indexed(&["apple", "aplomb"]);
        let options = MatchOptions::default()
            .with_min_match_score(0.6)
            .with_fuzzy_tail();
        let words = prefix_match(&indexed, "apl", 5, &options);
        assert_eq!(values(&words), vec!["aplomb", "apple"]);
        assert!(!words[0].fuzzy_matched);
        assert!(words[1].fuzzy_matched);
    }

    #[test]
    fn test_prefix_structured_field_only() {
        let mut indexed = indexed(&["alpha"]);
        indexed.structured_fields.insert(
            "tags".to_string(),
            Arc::new(IndexSnapshot::from_words(vec![doc_word("algebra")])),
        );
        let options = MatchOptions::default().with_field_key("tags");
        assert_eq!(values(&prefix_match(&indexed, "al", 5, &options)), vec!["algebra"]);

        let missing = MatchOptions::default().with_field_key("status");
        assert!(prefix_match(&indexed, "al", 5, &missing).is_empty());
    }
}
