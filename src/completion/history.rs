//! Selection history
//!
//! A context-keyed frequency tree: `context → value → source → {count, last used day}`.
//! The context is the text preceding a completion (see `Query::history_context`);
//! the same word accepted after different contexts is counted separately.
//!
//! Counts only grow, except when `purge` drops entries by age or evicts them to
//! respect the size cap. The store tracks how many mutations happened since the
//! last persisted snapshot so hosts can write it back opportunistically.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::word::{SourceType, Word};

/// One recorded acceptance bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub count: u32,
    pub last_used_epoch_day: i64,
}

/// Persisted form of the tree
pub type HistoryTree = BTreeMap<String, BTreeMap<String, BTreeMap<SourceType, HistoryEntry>>>;

/// Days since 1970-01-01 in UTC
pub fn today_epoch_day() -> i64 {
    chrono::Utc::now().timestamp().div_euclid(86_400)
}

#[derive(Debug, Clone, Default)]
pub struct SelectionHistoryStore {
    tree: HistoryTree,
    version: u64,
    persisted_version: u64,
    persist_threshold: u64,
}

impl SelectionHistoryStore {
    pub fn new(persist_threshold: u64) -> Self {
        Self {
            persist_threshold,
            ..Self::default()
        }
    }

    /// Record one acceptance of `word` after `context`
    pub fn increment(&mut self, word: &Word, context: &str) {
        self.increment_on(word, context, today_epoch_day());
    }

    pub fn increment_on(&mut self, word: &Word, context: &str, today: i64) {
        let entry = self
            .tree
            .entry(context.to_string())
            .or_default()
            .entry(word.history_key().to_string())
            .or_default()
            .entry(word.source_type())
            .or_insert(HistoryEntry {
                count: 0,
                last_used_epoch_day: today,
            });
        entry.count = entry.count.saturating_add(1);
        entry.last_used_epoch_day = entry.last_used_epoch_day.max(today);
        self.version += 1;
    }

    pub fn count(&self, context: &str, value: &str, source: SourceType) -> u32 {
        self.entry(context, value, source).map_or(0, |e| e.count)
    }

    pub fn entry(&self, context: &str, value: &str, source: SourceType) -> Option<&HistoryEntry> {
        self.tree.get(context)?.get(value)?.get(&source)
    }

    /// Move candidates with recorded history for `context` ahead, higher count first
    ///
    /// The sort is stable, so equal counts keep the incoming order. Fuzzy candidates
    /// never overtake exact ones.
    pub fn boost(&self, mut candidates: Vec<Word>, context: &str) -> Vec<Word> {
        let Some(by_value) = self.tree.get(context) else {
            return candidates;
        };
        candidates.sort_by_cached_key(|word| {
            let count = by_value
                .get(word.history_key())
                .and_then(|by_source| by_source.get(&word.source_type()))
                .map_or(0, |e| e.count);
            (word.fuzzy_matched, Reverse(count))
        });
        candidates
    }

    /// Drop entries unused for more than `max_age_days`, then evict down to `max_entries`
    ///
    /// Eviction removes the lowest counts first; among equal counts the least recently
    /// used goes first. Returns the number of entries removed.
    pub fn purge(&mut self, max_age_days: u32, max_entries: Option<usize>) -> usize {
        self.purge_with(max_age_days, max_entries, today_epoch_day())
    }

    pub fn purge_with(&mut self, max_age_days: u32, max_entries: Option<usize>, today: i64) -> usize {
        let before = self.len();

        for by_value in self.tree.values_mut() {
            for by_source in by_value.values_mut() {
                by_source.retain(|_, e| today - e.last_used_epoch_day <= i64::from(max_age_days));
            }
        }
        self.prune_empty();

        if let Some(max_entries) = max_entries {
            let overflow = self.len().saturating_sub(max_entries);
            if overflow > 0 {
                let mut ranked: Vec<(u32, i64, String, String, SourceType)> = self
                    .iter()
                    .map(|(context, value, source, e)| {
                        (e.count, e.last_used_epoch_day, context.to_string(), value.to_string(), source)
                    })
                    .collect();
                ranked.sort();
                for (_, _, context, value, source) in ranked.into_iter().take(overflow) {
                    if let Some(by_source) = self.tree.get_mut(&context).and_then(|v| v.get_mut(&value)) {
                        by_source.remove(&source);
                    }
                }
                self.prune_empty();
            }
        }

        let removed = before - self.len();
        if removed > 0 {
            self.version += 1;
            debug!("Purged {} selection history entries ({} remain)", removed, self.len());
        }
        removed
    }

    fn prune_empty(&mut self) {
        for by_value in self.tree.values_mut() {
            by_value.retain(|_, by_source| !by_source.is_empty());
        }
        self.tree.retain(|_, by_value| !by_value.is_empty());
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &str, SourceType, &HistoryEntry)> {
        self.tree.iter().flat_map(|(context, by_value)| {
            by_value.iter().flat_map(move |(value, by_source)| {
                by_source
                    .iter()
                    .map(move |(source, e)| (context.as_str(), value.as_str(), *source, e))
            })
        })
    }

    /// Number of `(context, value, source)` entries
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn export_snapshot(&self) -> HistoryTree {
        self.tree.clone()
    }

    /// Replace the tree with a loaded snapshot; the store starts clean
    pub fn import_snapshot(&mut self, tree: HistoryTree) {
        self.tree = tree;
        self.prune_empty();
        self.version = 0;
        self.persisted_version = 0;
    }

    /// Record that the current state has been written out
    pub fn mark_persisted(&mut self) {
        self.persisted_version = self.version;
    }

    /// Record that the state as of `version` has been written out
    pub fn mark_persisted_at(&mut self, version: u64) {
        self.persisted_version = self.persisted_version.max(version.min(self.version));
    }

    /// Mutation counter, bumped by every increment and effective purge
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_persist_threshold(&mut self, threshold: u64) {
        self.persist_threshold = threshold;
    }

    pub fn should_persist(&self) -> bool {
        self.version - self.persisted_version >= self.persist_threshold.max(1)
    }
}
