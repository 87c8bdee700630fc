//! Engine settings
//!
//! `Settings` is the raw, user-editable tree (camelCase JSON). `resolve` turns it into
//! `ResolvedSettings`: strategy names become enums, patterns become compiled regexes.
//! Resolution is lenient: anything that cannot be interpreted falls back to its
//! default and is reported alongside the result.
//!
//! Components receive an `Arc<ResolvedSettings>` and never mutate it; an update
//! produces a new snapshot.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::completion::matching::{FieldMatchStrategy, FuzzyOptions, MatchStrategy};
use crate::error::ConfigurationError;
use crate::providers::ColumnDelimiter;
use crate::tokenizer::{TokenizeStrategy, Tokenizer, create_tokenizer};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub trigger: TriggerSettings,
    pub current_document: CurrentDocumentSettings,
    pub collection: CollectionSettings,
    pub custom_dictionary: CustomDictionarySettings,
    pub cross_reference: CrossReferenceSettings,
    pub structured_field: StructuredFieldSettings,
    pub synonyms: SynonymSettings,
    pub history: HistorySettings,
    pub debug: DebugSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerSettings {
    pub strategy: String,
    pub match_strategy: String,
    pub case_sensitive: bool,
    pub max_number_of_suggestions: usize,
    pub max_number_of_words_as_phrase: usize,
    /// 0 uses the tokenizer's own trigger threshold
    pub min_number_of_characters_triggered: usize,
    pub min_number_of_words_triggered_phrase: usize,
    pub complement_automatically: bool,
    pub delay_milli_seconds: u64,
    pub leading_edge: bool,
    pub patterns_to_suppress_trigger: Vec<String>,
    pub first_characters_disable_suggestions: String,
    pub fuzzy_match: bool,
    pub min_fuzzy_match_score: f64,
    pub insert_space_after_completion: bool,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            strategy: TokenizeStrategy::Default.name().to_string(),
            match_strategy: MatchStrategy::Prefix.name().to_string(),
            case_sensitive: false,
            max_number_of_suggestions: 5,
            max_number_of_words_as_phrase: 3,
            min_number_of_characters_triggered: 0,
            min_number_of_words_triggered_phrase: 1,
            complement_automatically: true,
            delay_milli_seconds: 0,
            leading_edge: false,
            patterns_to_suppress_trigger: vec![r"^~~~.*".to_string(), r"^```.*".to_string()],
            first_characters_disable_suggestions: ":/^".to_string(),
            fuzzy_match: false,
            min_fuzzy_match_score: 0.5,
            insert_space_after_completion: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrentDocumentSettings {
    pub enabled: bool,
    /// 0 uses the tokenizer's indexing threshold
    pub min_number_of_characters: usize,
    pub only_english: bool,
}

impl Default for CurrentDocumentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_number_of_characters: 0,
            only_english: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectionSettings {
    pub enabled: bool,
    pub min_number_of_characters: usize,
    pub include_path_prefix_patterns: Vec<String>,
    pub exclude_path_prefix_patterns: Vec<String>,
    /// Only index documents under the active document's directory
    pub only_under_current_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomDictionarySettings {
    pub enabled: bool,
    pub paths: Vec<String>,
    pub column_delimiter: String,
    pub word_regex_pattern: String,
    pub hide_delimiter: String,
    pub caret_marker: String,
}

impl Default for CustomDictionarySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            paths: Vec::new(),
            column_delimiter: ColumnDelimiter::Tab.name().to_string(),
            word_regex_pattern: String::new(),
            hide_delimiter: String::new(),
            caret_marker: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrossReferenceSettings {
    pub enabled: bool,
    pub suggest_with_alias: bool,
    pub include_path_prefix_patterns: Vec<String>,
    pub exclude_path_prefix_patterns: Vec<String>,
    pub use_wiki_links: bool,
}

impl Default for CrossReferenceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            suggest_with_alias: false,
            include_path_prefix_patterns: Vec::new(),
            exclude_path_prefix_patterns: Vec::new(),
            use_wiki_links: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructuredFieldSettings {
    pub enabled: bool,
    pub match_strategy: String,
    pub insert_comma_after_completion: bool,
}

impl Default for StructuredFieldSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            match_strategy: "inherit".to_string(),
            insert_comma_after_completion: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynonymSettings {
    pub matching_without_emoji: bool,
    pub treat_accent_diacritics_as_alphabetic_characters: bool,
}

impl Default for SynonymSettings {
    fn default() -> Self {
        Self {
            matching_without_emoji: true,
            treat_accent_diacritics_as_alphabetic_characters: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistorySettings {
    pub enabled: bool,
    /// Defaults to the platform data directory
    pub file_path: Option<PathBuf>,
    pub max_days_to_keep_history: u32,
    /// 0 keeps every entry
    pub max_number_of_history_to_keep: usize,
    pub persist_threshold: u64,
    /// Whitespace tokens before the completion that form the history context
    pub context_tokens: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            file_path: None,
            max_days_to_keep_history: 30,
            max_number_of_history_to_keep: 0,
            persist_threshold: 10,
            context_tokens: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebugSettings {
    pub show_log_about_performance: bool,
}

/// `<data dir>/complement-engine/selection-histories.json`
pub fn default_history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("complement-engine").join("selection-histories.json"))
}

impl Settings {
    /// Read settings from a JSON file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let parsed: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON from {}", path.display()))?;
        Ok(parsed)
    }

    /// Interpret names and patterns, substituting defaults for anything invalid
    pub fn resolve(&self) -> (ResolvedSettings, Vec<ConfigurationError>) {
        let mut errors = Vec::new();

        let tokenize_strategy = TokenizeStrategy::from_name(&self.trigger.strategy)
            .unwrap_or_else(|e| {
                errors.push(e);
                TokenizeStrategy::Default
            });
        let match_strategy = MatchStrategy::from_name(&self.trigger.match_strategy)
            .unwrap_or_else(|e| {
                errors.push(e);
                MatchStrategy::Prefix
            });
        let field_match_strategy = FieldMatchStrategy::from_name(&self.structured_field.match_strategy)
            .unwrap_or_else(|e| {
                errors.push(e);
                FieldMatchStrategy::Inherit
            });
        let column_delimiter = ColumnDelimiter::from_name(&self.custom_dictionary.column_delimiter)
            .unwrap_or_else(|e| {
                errors.push(e);
                ColumnDelimiter::Tab
            });

        let suppress_patterns = self
            .trigger
            .patterns_to_suppress_trigger
            .iter()
            .filter(|p| !p.is_empty())
            .filter_map(|p| compile(p).map_err(|e| errors.push(e)).ok())
            .collect();

        let word_pattern = Some(self.custom_dictionary.word_regex_pattern.as_str())
            .filter(|p| !p.is_empty())
            .and_then(|p| compile(p).map_err(|e| errors.push(e)).ok());

        let resolved = ResolvedSettings {
            raw: self.clone(),
            tokenizer: create_tokenizer(tokenize_strategy),
            tokenize_strategy,
            match_strategy,
            field_match_strategy,
            column_delimiter,
            suppress_patterns,
            word_pattern,
        };
        (resolved, errors)
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigurationError> {
    Regex::new(pattern).map_err(|source| ConfigurationError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Immutable, interpreted settings snapshot
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub raw: Settings,
    pub tokenize_strategy: TokenizeStrategy,
    pub tokenizer: Arc<dyn Tokenizer>,
    pub match_strategy: MatchStrategy,
    pub field_match_strategy: FieldMatchStrategy,
    pub column_delimiter: ColumnDelimiter,
    pub suppress_patterns: Vec<Regex>,
    pub word_pattern: Option<Regex>,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Settings::default().resolve().0
    }
}

impl ResolvedSettings {
    pub fn min_trigger_chars(&self) -> usize {
        match self.raw.trigger.min_number_of_characters_triggered {
            0 => self.tokenize_strategy.trigger_threshold(),
            n => n,
        }
    }

    /// Minimum length for a word to be indexed, given a section override (0 = tokenizer default)
    pub fn min_indexed_chars(&self, configured: usize) -> usize {
        match configured {
            0 => self.tokenize_strategy.indexing_threshold(),
            n => n,
        }
    }

    pub fn fuzzy_options(&self) -> FuzzyOptions {
        FuzzyOptions {
            min_match_score: self.raw.trigger.min_fuzzy_match_score,
        }
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        self.raw.history.file_path.clone().or_else(default_history_path)
    }

    pub fn history_max_entries(&self) -> Option<usize> {
        match self.raw.history.max_number_of_history_to_keep {
            0 => None,
            n => Some(n),
        }
    }
}
