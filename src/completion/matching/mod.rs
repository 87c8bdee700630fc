//! Match strategies
//!
//! Every strategy is a plain function `(indices, query token, limit, options) -> words`.
//! Results are grouped by source in merge order (current document, collection,
//! custom dictionary, cross-reference) and capped at `limit` per source. When a
//! structured-field key is set only that field's index is consulted.
//!
//! Strategies never fail: a token with nothing to match contributes no candidates.

mod fuzzy;
mod partial;
mod prefix;

pub use fuzzy::{fuzzy_match, similarity};
pub use partial::partial_match;
pub use prefix::prefix_match;

use std::fmt;

use serde::{Deserialize, Serialize};

use super::index::{IndexSnapshot, IndexedWords};
use super::word::{SourceType, Word};
use crate::error::ConfigurationError;

pub type MatchFn = fn(&IndexedWords, &str, usize, &MatchOptions) -> Vec<Word>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyOptions {
    /// Candidates scoring below this similarity (0.0..=1.0) are discarded
    pub min_match_score: f64,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            min_match_score: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOptions {
    pub field_key: Option<String>,
    pub case_sensitive: bool,
    /// Threshold for approximate candidates, honoured by every strategy that scores them
    pub fuzzy: FuzzyOptions,
    /// Append approximate candidates after the exact ones of `Prefix` and `Partial`
    pub fuzzy_tail: bool,
}

impl MatchOptions {
    pub fn with_field_key(mut self, key: impl Into<String>) -> Self {
        self.field_key = Some(key.into());
        self
    }

    pub fn with_min_match_score(mut self, min_match_score: f64) -> Self {
        self.fuzzy = FuzzyOptions { min_match_score };
        self
    }

    pub fn with_fuzzy_tail(mut self) -> Self {
        self.fuzzy_tail = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    Prefix,
    /// Substring containment; scans every word of every source, materially slower than `Prefix`
    Partial,
    Fuzzy,
}

impl MatchStrategy {
    pub const ALL: [MatchStrategy; 3] = [Self::Prefix, Self::Partial, Self::Fuzzy];

    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| ConfigurationError::UnknownMatchStrategy(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Partial => "partial",
            Self::Fuzzy => "fuzzy",
        }
    }

    pub fn handler(&self) -> MatchFn {
        match self {
            Self::Prefix => prefix_match,
            Self::Partial => partial_match,
            Self::Fuzzy => fuzzy_match,
        }
    }

    pub fn find(
        &self,
        indexed: &IndexedWords,
        query: &str,
        limit: usize,
        options: &MatchOptions,
    ) -> Vec<Word> {
        (self.handler())(indexed, query, limit, options)
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-field override of the global strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldMatchStrategy {
    #[default]
    Inherit,
    Specific(MatchStrategy),
}

impl FieldMatchStrategy {
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        if name == "inherit" {
            return Ok(Self::Inherit);
        }
        MatchStrategy::from_name(name)
            .map(Self::Specific)
            .map_err(|_| ConfigurationError::UnknownFieldMatchStrategy(name.to_string()))
    }

    pub fn resolve(&self, global: MatchStrategy) -> MatchStrategy {
        match self {
            Self::Inherit => global,
            Self::Specific(strategy) => *strategy,
        }
    }
}

/// Indices consulted for a query, in merge order
pub(crate) fn sources<'a>(indexed: &'a IndexedWords, options: &MatchOptions) -> Vec<&'a IndexSnapshot> {
    match &options.field_key {
        Some(key) => indexed.structured_field(key).into_iter().collect(),
        None => indexed.general_sources().to_vec(),
    }
}

fn fold(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

pub(crate) fn starts_with(word: &Word, query: &str, case_sensitive: bool) -> bool {
    let query = fold(query, case_sensitive);
    word.match_targets()
        .any(|target| fold(target, case_sensitive).starts_with(&query))
}

pub(crate) fn contains(word: &Word, query: &str, case_sensitive: bool) -> bool {
    let query = fold(query, case_sensitive);
    word.match_targets()
        .any(|target| fold(target, case_sensitive).contains(&query))
}

/// Uppercase the first letter of document words when the query is capitalised
pub(crate) fn adjust_case(mut word: Word, query: &str) -> Word {
    let capitalised = query.chars().next().is_some_and(char::is_uppercase);
    let eligible = matches!(
        word.source_type(),
        SourceType::CurrentDocument | SourceType::Collection
    );
    if capitalised && eligible {
        let mut chars = word.value.chars();
        if let Some(first) = chars.next() {
            let displayed: String = first.to_uppercase().chain(chars).collect();
            if displayed != word.value {
                word.indexed_value = Some(std::mem::replace(&mut word.value, displayed));
            }
        }
    }
    word
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_strategy_from_name() {
        assert_eq!(MatchStrategy::from_name("partial").unwrap(), MatchStrategy::Partial);
        assert!(matches!(
            MatchStrategy::from_name("regex"),
            Err(ConfigurationError::UnknownMatchStrategy(_))
        ));
    }

    #[test]
    fn test_field_strategy_inherits() {
        let inherit = FieldMatchStrategy::from_name("inherit").unwrap();
        assert_eq!(inherit.resolve(MatchStrategy::Partial), MatchStrategy::Partial);

        let specific = FieldMatchStrategy::from_name("prefix").unwrap();
        assert_eq!(specific.resolve(MatchStrategy::Partial), MatchStrategy::Prefix);

        assert!(matches!(
            FieldMatchStrategy::from_name("nope"),
            Err(ConfigurationError::UnknownFieldMatchStrategy(_))
        ));
    }

    #[test]
    fn test_adjust_case_only_for_document_words() {
        let adjusted = adjust_case(doc_word("apple"), "Ap");
        assert_eq!(adjusted.value, "Apple");
        assert_eq!(adjusted.history_key(), "apple");
        assert_eq!(adjust_case(doc_word("Apple"), "Ap").indexed_value, None);
        assert_eq!(adjust_case(doc_word("apple"), "ap").value, "apple");
        assert_eq!(adjust_case(dictionary_word("apple"), "Ap").value, "apple");
    }

    #[test]
    fn test_handler_dispatch() {
        let indexed = indexed(&["apple", "grape"]);
        let options = MatchOptions::default();
        assert_eq!(values(&MatchStrategy::Prefix.find(&indexed, "ap", 5, &options)), vec!["apple"]);
        assert_eq!(values(&MatchStrategy::Partial.find(&indexed, "ap", 5, &options)), vec!["apple", "grape"]);
    }
}
