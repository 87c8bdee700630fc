use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::current_document::document_words;
use super::path_filter::PathFilter;
use super::{RefreshContext, RefreshOutcome, RefreshReport, WordProvider};
use crate::backend::refresh_gate::RefreshGate;
use crate::completion::index::{IndexSnapshot, WordIndex};
use crate::completion::word::{SourceType, WordPayload};
use crate::error::SourceUnavailable;

/// Words of every document in the store that passes the path filters
#[derive(Debug)]
pub struct CollectionProvider {
    index: WordIndex,
    gate: RefreshGate,
}

impl Default for CollectionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionProvider {
    pub fn new() -> Self {
        Self {
            index: WordIndex::new(SourceType::Collection),
            gate: RefreshGate::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.index.snapshot()
    }
}

#[async_trait]
impl WordProvider for CollectionProvider {
    fn source_type(&self) -> SourceType {
        SourceType::Collection
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn refresh_words(&self, ctx: RefreshContext<'_>) -> RefreshOutcome {
        let section = &ctx.settings.raw.collection;
        if !section.enabled {
            self.index.clear();
            return RefreshOutcome::Disabled;
        }
        let Some(_guard) = self.gate.try_begin() else {
            debug!("Collection refresh already running; coalesced");
            return RefreshOutcome::Coalesced;
        };

        let started = Instant::now();
        let mut report = RefreshReport::default();
        let documents = match ctx.store.list_documents().await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("Cannot list documents: {}", e);
                self.index.clear();
                return RefreshOutcome::Completed(report);
            }
        };

        let filter = PathFilter::new(
            &section.include_path_prefix_patterns,
            &section.exclude_path_prefix_patterns,
        );
        let directory = ctx
            .active_document
            .filter(|_| section.only_under_current_directory)
            .map(|active| active.parent());
        let min_chars = ctx.settings.min_indexed_chars(section.min_number_of_characters);

        let mut words = Vec::new();
        for id in documents
            .iter()
            .filter(|id| filter.allows(id.as_str()))
            .filter(|id| directory.is_none_or(|dir| id.is_under(dir)))
        {
            match ctx.store.read_text(id).await {
                Ok(text) => {
                    words.extend(document_words(&text, ctx.settings, min_chars, false, || {
                        WordPayload::Collection {
                            created_path: id.to_string(),
                        }
                    }));
                }
                Err(source) => {
                    warn!("Skipping unreadable document {}: {}", id, source);
                    report.skipped.push(SourceUnavailable {
                        id: id.clone(),
                        source,
                    });
                }
            }
        }
        self.index.bulk_replace(words);

        report.word_count = self.index.count();
        report.elapsed = started.elapsed();
        info!(
            "Indexed {} collection words from {} documents ({} skipped)",
            report.word_count,
            documents.len(),
            report.skipped.len()
        );
        if ctx.settings.raw.debug.show_log_about_performance {
            debug!("Index collection tokens: {}[ms]", report.elapsed.as_millis());
        }
        RefreshOutcome::Completed(report)
    }

    fn clear_words(&self) {
        self.index.clear();
    }

    fn word_count(&self) -> usize {
        self.index.count()
    }
}
