//! Sharded word index keyed by leading character
//!
//! Each provider owns one `WordIndex`. Words are kept in scan order; buckets hold
//! positions into that list, keyed by the case-folded first character of the value
//! and of every alias. Within a bucket the order is scan order, never alphabetical.
//!
//! Readers take an `Arc<IndexSnapshot>` and never observe a partial rebuild:
//! `bulk_replace` builds the new snapshot off to the side and swaps the pointer.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use super::word::{SourceType, Word};

/// Lookup key for a string: its first character, lowercased
pub fn bucket_key(text: &str) -> Option<char> {
    text.chars().next().map(fold_char)
}

fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Immutable view of an index at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    words: Vec<Word>,
    buckets: FxHashMap<char, Vec<usize>>,
}

impl IndexSnapshot {
    pub fn from_words(words: impl IntoIterator<Item = Word>) -> Self {
        let mut snapshot = Self::default();
        let mut seen = FxHashSet::default();
        for word in words {
            if seen.insert(word.value.clone()) {
                snapshot.push(word);
            }
        }
        snapshot
    }

    fn contains_value(&self, value: &str) -> bool {
        bucket_key(value)
            .and_then(|key| self.buckets.get(&key))
            .is_some_and(|positions| positions.iter().any(|&i| self.words[i].value == value))
    }

    fn push(&mut self, word: Word) {
        let position = self.words.len();
        let mut keys: Vec<char> = word.match_targets().filter_map(bucket_key).collect();
        keys.dedup();
        let mut added = FxHashSet::default();
        for key in keys {
            if added.insert(key) {
                self.buckets.entry(key).or_default().push(position);
            }
        }
        self.words.push(word);
    }

    /// Words whose value or alias starts with `first` (case-folded), in scan order
    pub fn bucket(&self, first: char) -> impl Iterator<Item = &Word> {
        self.buckets
            .get(&fold_char(first))
            .into_iter()
            .flatten()
            .map(|&i| &self.words[i])
    }

    /// Every distinct word in scan order
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn bucket_keys(&self) -> impl Iterator<Item = &char> {
        self.buckets.keys()
    }
}

/// Word index for a single source
#[derive(Debug)]
pub struct WordIndex {
    source: SourceType,
    snapshot: RwLock<Arc<IndexSnapshot>>,
}

impl WordIndex {
    pub fn new(source: SourceType) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::new(IndexSnapshot::default())),
        }
    }

    pub fn source(&self) -> SourceType {
        self.source
    }

    /// Append a word, skipping it when a word with the same value is already indexed
    ///
    /// Returns `false` when the word was a duplicate.
    pub fn insert(&self, word: Word) -> bool {
        debug_assert_eq!(word.source_type(), self.source);
        let mut guard = self.snapshot.write();
        if guard.contains_value(&word.value) {
            return false;
        }
        // Copy-on-write: readers holding the previous Arc keep their view
        Arc::make_mut(&mut guard).push(word);
        true
    }

    /// Replace the whole index with `words`
    pub fn bulk_replace(&self, words: impl IntoIterator<Item = Word>) {
        let next = Arc::new(IndexSnapshot::from_words(words));
        *self.snapshot.write() = next;
    }

    pub fn clear(&self) {
        *self.snapshot.write() = Arc::new(IndexSnapshot::default());
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn bucket(&self, first: char) -> Vec<Word> {
        self.snapshot().bucket(first).cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.snapshot.read().len()
    }
}

/// Snapshots of every source index, handed to match strategies
#[derive(Debug, Clone, Default)]
pub struct IndexedWords {
    pub current_document: Arc<IndexSnapshot>,
    pub collection: Arc<IndexSnapshot>,
    pub custom_dictionary: Arc<IndexSnapshot>,
    pub cross_reference: Arc<IndexSnapshot>,
    pub structured_fields: FxHashMap<String, Arc<IndexSnapshot>>,
}

impl IndexedWords {
    /// General sources in merge order
    pub fn general_sources(&self) -> [&IndexSnapshot; 4] {
        [
            &self.current_document,
            &self.collection,
            &self.custom_dictionary,
            &self.cross_reference,
        ]
    }

    pub fn structured_field(&self, key: &str) -> Option<&IndexSnapshot> {
        self.structured_fields.get(key).map(Arc::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::word::WordPayload;

    fn word(value: &str) -> Word {
        Word::new(value, WordPayload::CurrentDocument)
    }

    #[test]
    fn test_insert_buckets_by_folded_first_char() {
        let index = WordIndex::new(SourceType::CurrentDocument);
        index.insert(word("Apple"));
        index.insert(word("apply"));
        index.insert(word("banana"));

        let values: Vec<_> = index.bucket('a').into_iter().map(|w| w.value).collect();
        assert_eq!(values, vec!["Apple", "apply"]);
        assert_eq!(index.bucket('A').len(), 2);
        assert_eq!(index.count(), 3);
    }

    #[test]
    fn test_insert_skips_duplicates() {
        let index = WordIndex::new(SourceType::CurrentDocument);
        assert!(index.insert(word("apple")));
        assert!(!index.insert(word("apple")));
        assert_eq!(index.count(), 1);
        assert_eq!(index.bucket('a').len(), 1);
    }

    #[test]
    fn test_aliases_share_buckets() {
        let index = WordIndex::new(SourceType::CurrentDocument);
        index.insert(word("émigré").with_aliases(vec!["emigre".into()]));
        assert_eq!(index.bucket('e').len(), 1);
        assert_eq!(index.bucket('é').len(), 1);
        assert_eq!(index.count(), 1);
    }

    #[test]
    fn test_bulk_replace_swaps_atomically() {
        let index = WordIndex::new(SourceType::CurrentDocument);
        index.bulk_replace(vec![word("old")]);
        let before = index.snapshot();

        index.bulk_replace(vec![word("new"), word("next")]);

        assert_eq!(before.len(), 1);
        assert_eq!(before.bucket('o').count(), 1);
        assert_eq!(index.count(), 2);
        assert_eq!(index.bucket('o').len(), 0);
    }

    #[test]
    fn test_insert_does_not_disturb_readers() {
        let index = WordIndex::new(SourceType::CurrentDocument);
        index.insert(word("alpha"));
        let reader = index.snapshot();
        index.insert(word("amber"));
        assert_eq!(reader.bucket('a').count(), 1);
        assert_eq!(index.snapshot().bucket('a').count(), 2);
    }

    #[test]
    fn test_clear() {
        let index = WordIndex::new(SourceType::CurrentDocument);
        index.bulk_replace(vec![word("alpha")]);
        index.clear();
        assert_eq!(index.count(), 0);
        assert!(index.snapshot().is_empty());
    }
}
