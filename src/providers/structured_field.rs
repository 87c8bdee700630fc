use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::store::FieldMap;
use super::{DocumentId, RefreshContext, RefreshOutcome, RefreshReport, WordProvider};
use crate::backend::refresh_gate::RefreshGate;
use crate::completion::index::{IndexSnapshot, WordIndex};
use crate::completion::word::{SourceType, Word, WordPayload};
use crate::error::SourceUnavailable;

/// Front-matter values, one index per field key
///
/// Fields are cached per document so a single changed document can be patched
/// without re-reading the others.
#[derive(Debug, Default)]
pub struct StructuredFieldProvider {
    fields_by_document: DashMap<DocumentId, FieldMap>,
    indices: DashMap<String, WordIndex>,
    gate: RefreshGate,
}

impl StructuredFieldProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> FxHashMap<String, Arc<IndexSnapshot>> {
        self.indices
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.indices.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Rebuild every key's index from the cached fields, documents in path order
    fn rebuild(&self) {
        let mut documents: Vec<(DocumentId, FieldMap)> = self
            .fields_by_document
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        documents.sort_by(|a, b| a.0.cmp(&b.0));

        let mut by_key: BTreeMap<String, Vec<Word>> = BTreeMap::new();
        for (id, fields) in &documents {
            for (key, values) in fields {
                by_key.entry(key.clone()).or_default().extend(values.iter().map(|value| {
                    Word::new(
                        value.as_str(),
                        WordPayload::StructuredField {
                            key: key.clone(),
                            created_path: id.to_string(),
                        },
                    )
                }));
            }
        }

        self.indices.retain(|key, _| by_key.contains_key(key));
        for (key, words) in by_key {
            self.indices
                .entry(key)
                .or_insert_with(|| WordIndex::new(SourceType::StructuredField))
                .bulk_replace(words);
        }
    }

    fn report(&self, started: Instant, skipped: Vec<SourceUnavailable>) -> RefreshOutcome {
        RefreshOutcome::Completed(RefreshReport {
            word_count: self.word_count(),
            skipped,
            elapsed: started.elapsed(),
        })
    }
}

#[async_trait]
impl WordProvider for StructuredFieldProvider {
    fn source_type(&self) -> SourceType {
        SourceType::StructuredField
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn refresh_words(&self, ctx: RefreshContext<'_>) -> RefreshOutcome {
        if !ctx.settings.raw.structured_field.enabled {
            self.clear_words();
            return RefreshOutcome::Disabled;
        }
        let Some(_guard) = self.gate.try_begin() else {
            debug!("Structured field refresh already running; coalesced");
            return RefreshOutcome::Coalesced;
        };

        let started = Instant::now();
        let documents = ctx.store.list_documents().await.unwrap_or_else(|e| {
            warn!("Cannot list documents: {}", e);
            Vec::new()
        });

        let mut skipped = Vec::new();
        self.fields_by_document.clear();
        for id in documents {
            match ctx.store.fields(&id).await {
                Ok(fields) => {
                    self.fields_by_document.insert(id, fields);
                }
                Err(source) => {
                    warn!("Skipping fields of {}: {}", id, source);
                    skipped.push(SourceUnavailable { id, source });
                }
            }
        }
        self.rebuild();

        debug!(
            "Indexed {} field keys from {} documents",
            self.indices.len(),
            self.fields_by_document.len()
        );
        self.report(started, skipped)
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    async fn update_word_index(&self, ctx: RefreshContext<'_>, id: &DocumentId) -> RefreshOutcome {
        if !ctx.settings.raw.structured_field.enabled {
            self.clear_words();
            return RefreshOutcome::Disabled;
        }
        let Some(_guard) = self.gate.try_begin() else {
            return RefreshOutcome::Coalesced;
        };

        let started = Instant::now();
        let mut skipped = Vec::new();
        match ctx.store.fields(id).await {
            Ok(fields) => {
                self.fields_by_document.insert(id.clone(), fields);
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                self.fields_by_document.remove(id);
            }
            Err(source) => {
                warn!("Skipping fields of {}: {}", id, source);
                skipped.push(SourceUnavailable {
                    id: id.clone(),
                    source,
                });
            }
        }
        self.rebuild();
        self.report(started, skipped)
    }

    fn clear_words(&self) {
        self.fields_by_document.clear();
        self.indices.clear();
    }

    fn word_count(&self) -> usize {
        self.indices.iter().map(|entry| entry.value().count()).sum()
    }
}
