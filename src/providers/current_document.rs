use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::synonyms::synonym_aliases;
use super::{DocumentId, RefreshContext, RefreshOutcome, RefreshReport, WordProvider};
use crate::backend::refresh_gate::RefreshGate;
use crate::completion::index::{IndexSnapshot, WordIndex};
use crate::completion::word::{SourceType, Word, WordPayload};
use crate::config::ResolvedSettings;
use crate::error::SourceUnavailable;
use crate::tokenizer::{EnglishOnlyTokenizer, Tokenizer};

fn is_numeric(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
}

/// Words of one document's text, in order of first appearance
pub(crate) fn document_words(
    text: &str,
    settings: &ResolvedSettings,
    min_chars: usize,
    only_english: bool,
    payload: impl Fn() -> WordPayload,
) -> Vec<Word> {
    let tokens = if only_english {
        EnglishOnlyTokenizer.tokenize(text, false)
    } else {
        settings.tokenizer.tokenize(text, false)
    };

    tokens
        .into_iter()
        .filter(|token| token.chars().count() >= min_chars)
        .filter(|token| !is_numeric(token))
        .map(|token| {
            let aliases = synonym_aliases(&token, &settings.raw.synonyms);
            Word::new(token, payload()).with_aliases(aliases)
        })
        .collect()
}

/// Words of the document the cursor is in
#[derive(Debug)]
pub struct CurrentDocumentProvider {
    index: WordIndex,
    gate: RefreshGate,
}

impl Default for CurrentDocumentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrentDocumentProvider {
    pub fn new() -> Self {
        Self {
            index: WordIndex::new(SourceType::CurrentDocument),
            gate: RefreshGate::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.index.snapshot()
    }
}

#[async_trait]
impl WordProvider for CurrentDocumentProvider {
    fn source_type(&self) -> SourceType {
        SourceType::CurrentDocument
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn refresh_words(&self, ctx: RefreshContext<'_>) -> RefreshOutcome {
        let section = &ctx.settings.raw.current_document;
        if !section.enabled {
            self.index.clear();
            return RefreshOutcome::Disabled;
        }
        let Some(_guard) = self.gate.try_begin() else {
            debug!("Current document refresh already running; coalesced");
            return RefreshOutcome::Coalesced;
        };

        let started = Instant::now();
        let mut report = RefreshReport::default();
        let Some(active) = ctx.active_document else {
            self.index.clear();
            return RefreshOutcome::Completed(report);
        };

        match ctx.store.read_text(active).await {
            Ok(text) => {
                let min_chars = ctx.settings.min_indexed_chars(section.min_number_of_characters);
                let words = document_words(&text, ctx.settings, min_chars, section.only_english, || {
                    WordPayload::CurrentDocument
                });
                self.index.bulk_replace(words);
            }
            Err(source) => {
                warn!("Cannot read current document {}: {}", active, source);
                self.index.clear();
                report.skipped.push(SourceUnavailable {
                    id: active.clone(),
                    source,
                });
            }
        }

        report.word_count = self.index.count();
        report.elapsed = started.elapsed();
        if ctx.settings.raw.debug.show_log_about_performance {
            debug!("Index current file tokens: {}[ms]", report.elapsed.as_millis());
        }
        RefreshOutcome::Completed(report)
    }

    /// Rescan only when `id` is the active document
    async fn update_word_index(&self, ctx: RefreshContext<'_>, id: &DocumentId) -> RefreshOutcome {
        if ctx.active_document == Some(id) {
            self.refresh_words(ctx).await
        } else {
            RefreshOutcome::Completed(RefreshReport {
                word_count: self.index.count(),
                ..RefreshReport::default()
            })
        }
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

    fn values(words: &[Word]) -> Vec<&str> {
        words.iter().map(|w| w.value.as_str()).collect()
    }

    #[test]
    fn test_document_words_thresholds_and_numbers() {
        let settings = ResolvedSettings::default();
        let words = document_words(
            "Rust: borrow checker, 12345 lifetimes; ok",
            &settings,
            5,
            false,
            || WordPayload::CurrentDocument,
        );
        assert_eq!(values(&words), vec!["borrow", "checker", "lifetimes"]);
    }

    #[test]
    fn test_document_words_only_english() {
        let settings = ResolvedSettings::default();
        let words = document_words("日本語 hello", &settings, 1, true, || WordPayload::CurrentDocument);
        assert_eq!(values(&words), vec!["hello"]);
    }

    #[test]
    fn test_document_words_carry_synonyms() {
        let settings = ResolvedSettings::default();
        let words = document_words("🍎apple", &settings, 1, false, || WordPayload::CurrentDocument);
        assert_eq!(words[0].aliases, vec!["apple"]);
    }
}
