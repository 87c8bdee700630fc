//! Completion core
//!
//! Words flow from the providers into per-source `index` snapshots; a keystroke goes
//! through `trigger` analysis, the `orchestrator` runs the `matching` strategies and
//! `ranking`, and an accepted candidate becomes an `insertion` while its selection is
//! recorded in `history`. `engine` ties these together; `service` adds debouncing in
//! front of it for hosts that drive a `host::SuggestionList`.

pub mod engine;
pub mod history;
pub mod host;
pub mod index;
pub mod insertion;
pub mod matching;
pub mod orchestrator;
pub mod ranking;
pub mod service;
pub mod trigger;
pub mod word;

pub use engine::CompletionEngine;
pub use history::{HistoryEntry, HistoryTree, SelectionHistoryStore};
pub use host::{Direction, InMemorySuggestionList, SuggestionList};
pub use index::{IndexSnapshot, IndexedWords, WordIndex};
pub use insertion::{Replacement, common_prefix, plan_insertion};
pub use matching::{FieldMatchStrategy, FuzzyOptions, MatchOptions, MatchStrategy};
pub use orchestrator::SuggestionOrchestrator;
pub use ranking::{HistoryBoost, RankingCriteria, rank_completions};
pub use service::{CLOSE_GRACE, SuggestionService};
pub use trigger::{SuppressReason, TriggerAnalyzer, TriggerInfo, TriggerRequest};
pub use word::{AliasInfo, Query, SourceType, Word, WordPayload};
