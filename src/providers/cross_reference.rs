use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::path_filter::PathFilter;
use super::{DocumentId, RefreshContext, RefreshOutcome, RefreshReport, WordProvider};
use crate::backend::refresh_gate::RefreshGate;
use crate::completion::index::{IndexSnapshot, WordIndex};
use crate::completion::word::{AliasInfo, SourceType, Word, WordPayload};
use crate::error::SourceUnavailable;

const ALIAS_FIELDS: [&str; 2] = ["aliases", "alias"];

fn link_word(value: &str, id: &DocumentId, phantom: bool, alias_info: Option<AliasInfo>) -> Word {
    Word::new(
        value,
        WordPayload::CrossReference {
            created_path: id.to_string(),
            phantom,
            alias_info,
        },
    )
}

/// Link targets: existing documents by name, plus phantom targets of unresolved links
#[derive(Debug)]
pub struct CrossReferenceProvider {
    index: WordIndex,
    gate: RefreshGate,
}

impl Default for CrossReferenceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossReferenceProvider {
    pub fn new() -> Self {
        Self {
            index: WordIndex::new(SourceType::CrossReference),
            gate: RefreshGate::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.index.snapshot()
    }
}

#[async_trait]
impl WordProvider for CrossReferenceProvider {
    fn source_type(&self) -> SourceType {
        SourceType::CrossReference
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn refresh_words(&self, ctx: RefreshContext<'_>) -> RefreshOutcome {
        let section = &ctx.settings.raw.cross_reference;
        if !section.enabled {
            self.index.clear();
            return RefreshOutcome::Disabled;
        }
        let Some(_guard) = self.gate.try_begin() else {
            debug!("Cross-reference refresh already running; coalesced");
            return RefreshOutcome::Coalesced;
        };

        let started = Instant::now();
        let mut report = RefreshReport::default();
        let filter = PathFilter::new(
            &section.include_path_prefix_patterns,
            &section.exclude_path_prefix_patterns,
        );

        let listed = ctx.store.list_documents().await.unwrap_or_else(|e| {
            warn!("Cannot list documents: {}", e);
            Vec::new()
        });
        let graph = ctx.store.link_graph().await.unwrap_or_else(|e| {
            warn!("Cannot build link graph: {}", e);
            Default::default()
        });

        let documents: BTreeSet<DocumentId> = listed
            .into_iter()
            .chain(graph.resolved.values().flatten().cloned())
            .filter(|id| filter.allows(id.as_str()))
            .collect();

        let mut stem_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for id in &documents {
            *stem_counts.entry(id.stem()).or_default() += 1;
        }

        let mut words = Vec::new();
        let mut alias_words = Vec::new();
        for id in &documents {
            // Ambiguous names are offered with their path
            let value = if stem_counts.get(id.stem()).copied().unwrap_or(0) > 1 {
                id.without_extension()
            } else {
                id.stem()
            };

            let aliases: Vec<String> = match ctx.store.fields(id).await {
                Ok(fields) => ALIAS_FIELDS
                    .iter()
                    .filter_map(|key| fields.get(*key))
                    .flatten()
                    .cloned()
                    .collect(),
                Err(source) => {
                    warn!("Cannot read aliases of {}: {}", id, source);
                    report.skipped.push(SourceUnavailable {
                        id: id.clone(),
                        source,
                    });
                    Vec::new()
                }
            };

            if section.suggest_with_alias {
                alias_words.extend(aliases.iter().map(|alias| {
                    link_word(alias, id, false, Some(AliasInfo { origin: id.to_string() }))
                }));
                words.push(link_word(value, id, false, None));
            } else {
                words.push(link_word(value, id, false, None).with_aliases(aliases));
            }
        }
        words.extend(alias_words);

        let mut phantoms = 0;
        for (source, targets) in &graph.unresolved {
            for target in targets.iter().filter(|t| filter.allows(t)) {
                words.push(link_word(target, source, true, None));
                phantoms += 1;
            }
        }
        self.index.bulk_replace(words);

        report.word_count = self.index.count();
        report.elapsed = started.elapsed();
        info!(
            "Indexed {} cross-reference words ({} documents, {} phantom links)",
            report.word_count,
            documents.len(),
            phantoms
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
