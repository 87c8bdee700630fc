//! User-maintained dictionaries
//!
//! One entry per line: `value<d>description<d>alias<d>alias...` where `<d>` is the
//! configured column delimiter. Two markers shape what gets inserted:
//! - hide delimiter: `foo;;;bar` is listed as `foo` but inserts `foobar`
//! - caret marker: `<li><CARET></li>` inserts `<li></li>` and leaves the caret at 4

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{DocumentId, RefreshContext, RefreshOutcome, RefreshReport, WordProvider};
use crate::backend::refresh_gate::RefreshGate;
use crate::completion::index::{IndexSnapshot, WordIndex};
use crate::completion::word::{SourceType, Word, WordPayload};
use crate::error::{ConfigurationError, SourceUnavailable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnDelimiter {
    Tab,
    Comma,
    Pipe,
}

impl ColumnDelimiter {
    pub const ALL: [ColumnDelimiter; 3] = [Self::Tab, Self::Comma, Self::Pipe];

    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigurationError::UnknownColumnDelimiter(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tab => "tab",
            Self::Comma => "comma",
            Self::Pipe => "pipe",
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::Tab => '\t',
            Self::Comma => ',',
            Self::Pipe => '|',
        }
    }
}

/// How dictionary lines are split and marked
#[derive(Debug, Clone)]
pub struct DictionaryFormat {
    pub delimiter: ColumnDelimiter,
    pub hide_delimiter: Option<String>,
    pub caret_marker: Option<String>,
    /// Entries whose value does not match are dropped
    pub word_pattern: Option<Regex>,
}

impl Default for DictionaryFormat {
    fn default() -> Self {
        Self {
            delimiter: ColumnDelimiter::Tab,
            hide_delimiter: None,
            caret_marker: None,
            word_pattern: None,
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    Some(text).filter(|t| !t.is_empty()).map(str::to_string)
}

/// Parse one dictionary line; blank lines and filtered entries yield `None`
pub fn parse_dictionary_line(line: &str, format: &DictionaryFormat) -> Option<Word> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return None;
    }

    let mut columns = line.split(format.delimiter.as_char());
    let raw_value = columns.next()?;
    let description = columns.next().and_then(non_empty);
    let aliases: Vec<String> = columns.filter_map(non_empty).collect();

    let mut value = raw_value.to_string();
    let mut inserted_text = None;

    if let Some(hide) = format.hide_delimiter.as_deref() {
        if let Some((shown, hidden)) = raw_value.split_once(hide) {
            value = shown.to_string();
            inserted_text = Some(format!("{shown}{hidden}"));
        }
    }

    if let Some(caret) = format.caret_marker.as_deref() {
        if value.contains(caret) || inserted_text.as_deref().is_some_and(|t| t.contains(caret)) {
            inserted_text.get_or_insert_with(|| value.clone());
            value = value.replacen(caret, "", 1);
        }
    }

    if value.is_empty() {
        return None;
    }
    if let Some(pattern) = &format.word_pattern {
        if !pattern.is_match(&value) {
            return None;
        }
    }

    let ignore_space_after_insertion = inserted_text.is_some();
    let mut word = Word::new(
        value,
        WordPayload::CustomDictionary {
            inserted_text,
            hide_delimiter: format.hide_delimiter.clone(),
            caret_marker: format.caret_marker.clone(),
            ignore_space_after_insertion,
        },
    )
    .with_aliases(aliases);
    word.description = description;
    Some(word)
}

#[derive(Debug)]
pub struct CustomDictionaryProvider {
    index: WordIndex,
    gate: RefreshGate,
}

impl Default for CustomDictionaryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomDictionaryProvider {
    pub fn new() -> Self {
        Self {
            index: WordIndex::new(SourceType::CustomDictionary),
            gate: RefreshGate::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.index.snapshot()
    }

    /// Add one entry without rescanning, e.g. right after the user registers a word
    pub fn add_word(&self, word: Word) -> bool {
        self.index.insert(word)
    }
}

#[async_trait]
impl WordProvider for CustomDictionaryProvider {
    fn source_type(&self) -> SourceType {
        SourceType::CustomDictionary
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn refresh_words(&self, ctx: RefreshContext<'_>) -> RefreshOutcome {
        let section = &ctx.settings.raw.custom_dictionary;
        if !section.enabled {
            self.index.clear();
            return RefreshOutcome::Disabled;
        }
        let Some(_guard) = self.gate.try_begin() else {
            debug!("Custom dictionary refresh already running; coalesced");
            return RefreshOutcome::Coalesced;
        };

        let started = Instant::now();
        let format = DictionaryFormat {
            delimiter: ctx.settings.column_delimiter,
            hide_delimiter: non_empty(&section.hide_delimiter),
            caret_marker: non_empty(&section.caret_marker),
            word_pattern: ctx.settings.word_pattern.clone(),
        };

        let mut report = RefreshReport::default();
        let mut words = Vec::new();
        for path in section.paths.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            let id = DocumentId::new(path);
            match ctx.store.read_text(&id).await {
                Ok(text) => {
                    words.extend(text.lines().filter_map(|line| parse_dictionary_line(line, &format)));
                }
                Err(source) => {
                    warn!("Skipping dictionary {}: {}", id, source);
                    report.skipped.push(SourceUnavailable { id, source });
                }
            }
        }
        self.index.bulk_replace(words);

        report.word_count = self.index.count();
        report.elapsed = started.elapsed();
        info!(
            "Indexed {} custom dictionary words ({} dictionaries skipped)",
            report.word_count,
            report.skipped.len()
        );
        RefreshOutcome::Completed(report)
    }

    fn clear_words(&self) {
        self.index.clear();
    }

    fn word_count(&self) -> usize {
        self.index.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format() -> DictionaryFormat {
        DictionaryFormat {
            hide_delimiter: Some(";;;".to_string()),
            caret_marker: Some("<CARET>".to_string()),
            ..DictionaryFormat::default()
        }
    }

    fn inserted_text(word: &Word) -> Option<&str> {
        match &word.payload {
            WordPayload::CustomDictionary { inserted_text, .. } => inserted_text.as_deref(),
            _ => None,
        }
    }

    #[test]
    fn test_columns() {
        let word = parse_dictionary_line("TypeScript\tA typed JavaScript\tts\tTS", &format()).unwrap();
        assert_eq!(word.value, "TypeScript");
        assert_eq!(word.description.as_deref(), Some("A typed JavaScript"));
        assert_eq!(word.aliases, vec!["ts", "TS"]);
        assert_eq!(inserted_text(&word), None);
    }

    #[test]
    fn test_hide_delimiter() {
        let word = parse_dictionary_line("foo;;;bar", &format()).unwrap();
        assert_eq!(word.value, "foo");
        assert_eq!(inserted_text(&word), Some("foobar"));
    }

    #[test]
    fn test_caret_marker() {
        let word = parse_dictionary_line("<li><CARET></li>", &format()).unwrap();
        assert_eq!(word.value, "<li></li>");
        assert_eq!(inserted_text(&word), Some("<li><CARET></li>"));
        assert!(matches!(
            word.payload,
            WordPayload::CustomDictionary {
                ignore_space_after_insertion: true,
                ..
            }
        ));
    }

    #[test]
    fn test_blank_and_filtered_lines() {
        assert!(parse_dictionary_line("", &format()).is_none());
        assert!(parse_dictionary_line("  \r", &format()).is_none());

        let filtered = DictionaryFormat {
            word_pattern: Regex::new("^[a-z]+$").ok(),
            ..DictionaryFormat::default()
        };
        assert!(parse_dictionary_line("Upper", &filtered).is_none());
        assert!(parse_dictionary_line("lower", &filtered).is_some());
    }

    #[test]
    fn test_column_delimiter_names() {
        assert_eq!(ColumnDelimiter::from_name("pipe").unwrap().as_char(), '|');
        assert!(ColumnDelimiter::from_name("semicolon").is_err());
    }
}
