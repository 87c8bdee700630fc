//! Completion engine facade
//!
//! `CompletionEngine` owns the five word providers, the selection history and the
//! current settings snapshot. It is shared behind an `Arc` by the host: refreshes run
//! as async tasks, suggestion and selection calls come from the editor thread.
//!
//! Settings are never mutated in place; `update_settings` swaps in a freshly resolved
//! snapshot that later calls pick up.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::history::SelectionHistoryStore;
use super::index::IndexedWords;
use super::insertion::{Replacement, plan_insertion};
use super::orchestrator::SuggestionOrchestrator;
use super::trigger::{SuppressReason, TriggerAnalyzer, TriggerInfo, TriggerRequest, predict_from_surroundings};
use super::word::{Query, SourceType, Word};
use crate::backend::HistoryFile;
use crate::config::{ResolvedSettings, Settings};
use crate::error::{ConfigurationError, Result};
use crate::providers::{
    CollectionProvider, CrossReferenceProvider, CurrentDocumentProvider, CustomDictionaryProvider,
    DocumentId, DocumentStore, RefreshContext, RefreshOutcome, StructuredFieldProvider,
    WordProvider,
};

pub struct CompletionEngine {
    store: Arc<dyn DocumentStore>,
    settings: RwLock<Arc<ResolvedSettings>>,
    active_document: RwLock<Option<DocumentId>>,
    current_document: CurrentDocumentProvider,
    collection: CollectionProvider,
    custom_dictionary: CustomDictionaryProvider,
    cross_reference: CrossReferenceProvider,
    structured_field: StructuredFieldProvider,
    history: Mutex<SelectionHistoryStore>,
    history_file: Option<HistoryFile>,
    trigger: Mutex<TriggerAnalyzer>,
}

fn log_configuration_errors(errors: &[ConfigurationError]) {
    for error in errors {
        warn!("Invalid setting (default used): {}", error);
    }
}

impl CompletionEngine {
    /// Engine without history persistence
    pub fn new(store: Arc<dyn DocumentStore>, settings: ResolvedSettings) -> Self {
        let history = SelectionHistoryStore::new(settings.raw.history.persist_threshold);
        Self {
            store,
            settings: RwLock::new(Arc::new(settings)),
            active_document: RwLock::new(None),
            current_document: CurrentDocumentProvider::new(),
            collection: CollectionProvider::new(),
            custom_dictionary: CustomDictionaryProvider::new(),
            cross_reference: CrossReferenceProvider::new(),
            structured_field: StructuredFieldProvider::new(),
            history: Mutex::new(history),
            history_file: None,
            trigger: Mutex::new(TriggerAnalyzer::new()),
        }
    }

    pub fn with_history_file(mut self, file: HistoryFile) -> Self {
        self.history_file = Some(file);
        self
    }

    /// Resolve `settings`, load the persisted history and build the engine
    ///
    /// Invalid settings are reported back and replaced by their defaults.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        settings: &Settings,
    ) -> (Self, Vec<ConfigurationError>) {
        let (resolved, errors) = settings.resolve();
        log_configuration_errors(&errors);

        let history_file = resolved
            .raw
            .history
            .enabled
            .then(|| resolved.history_path())
            .flatten()
            .map(HistoryFile::new);

        let mut engine = Self::new(store, resolved);
        if let Some(file) = history_file {
            engine = engine.with_history_file(file);
            engine.load_history().await;
        }
        (engine, errors)
    }

    /// Replace the in-memory history with the persisted snapshot
    pub async fn load_history(&self) {
        let Some(file) = &self.history_file else {
            return;
        };
        let tree = file.load().await;
        let mut history = self.history.lock();
        history.import_snapshot(tree);
        info!("Selection history ready ({} entries)", history.len());
    }

    /// Write the history snapshot if a history file is configured
    pub async fn persist_history(&self) -> Result<()> {
        let Some(file) = &self.history_file else {
            return Ok(());
        };
        let (tree, version) = {
            let history = self.history.lock();
            (history.export_snapshot(), history.version())
        };
        file.save(&tree).await?;
        self.history.lock().mark_persisted_at(version);
        Ok(())
    }

    pub fn settings(&self) -> Arc<ResolvedSettings> {
        self.settings.read().clone()
    }

    /// Swap in a new settings snapshot; returns the settings that fell back to defaults
    pub fn update_settings(&self, settings: &Settings) -> Vec<ConfigurationError> {
        let (resolved, errors) = settings.resolve();
        log_configuration_errors(&errors);
        self.history
            .lock()
            .set_persist_threshold(resolved.raw.history.persist_threshold);
        *self.settings.write() = Arc::new(resolved);
        self.trigger.lock().reset();
        errors
    }

    pub fn active_document(&self) -> Option<DocumentId> {
        self.active_document.read().clone()
    }

    /// Switch the document the cursor is in; the trigger state starts over
    pub fn set_active_document(&self, id: Option<DocumentId>) {
        *self.active_document.write() = id;
        self.trigger.lock().reset();
    }

    fn providers(&self) -> [&dyn WordProvider; 5] {
        [
            &self.current_document,
            &self.collection,
            &self.custom_dictionary,
            &self.cross_reference,
            &self.structured_field,
        ]
    }

    fn provider(&self, source: SourceType) -> &dyn WordProvider {
        match source {
            SourceType::CurrentDocument => &self.current_document,
            SourceType::Collection => &self.collection,
            SourceType::CustomDictionary => &self.custom_dictionary,
            SourceType::CrossReference => &self.cross_reference,
            SourceType::StructuredField => &self.structured_field,
        }
    }

    /// Full rescan of one source
    pub async fn refresh(&self, source: SourceType) -> RefreshOutcome {
        let settings = self.settings();
        let active = self.active_document();
        let ctx = RefreshContext {
            store: self.store.as_ref(),
            settings: &settings,
            active_document: active.as_ref(),
        };
        let outcome = self.provider(source).refresh_words(ctx).await;
        log_outcome(source, &outcome);
        outcome
    }

    pub async fn refresh_current_document(&self) -> RefreshOutcome {
        self.refresh(SourceType::CurrentDocument).await
    }

    pub async fn refresh_collection(&self) -> RefreshOutcome {
        self.refresh(SourceType::Collection).await
    }

    pub async fn refresh_custom_dictionary(&self) -> RefreshOutcome {
        self.refresh(SourceType::CustomDictionary).await
    }

    pub async fn refresh_cross_reference(&self) -> RefreshOutcome {
        self.refresh(SourceType::CrossReference).await
    }

    pub async fn refresh_structured_fields(&self) -> RefreshOutcome {
        self.refresh(SourceType::StructuredField).await
    }

    /// Rescan every source concurrently
    pub async fn refresh_all(&self) -> Vec<(SourceType, RefreshOutcome)> {
        let (current_document, collection, custom_dictionary, cross_reference, structured_field) = futures::join!(
            self.refresh_current_document(),
            self.refresh_collection(),
            self.refresh_custom_dictionary(),
            self.refresh_cross_reference(),
            self.refresh_structured_fields(),
        );
        vec![
            (SourceType::CurrentDocument, current_document),
            (SourceType::Collection, collection),
            (SourceType::CustomDictionary, custom_dictionary),
            (SourceType::CrossReference, cross_reference),
            (SourceType::StructuredField, structured_field),
        ]
    }

    /// Patch every source for one changed document
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn on_document_changed(&self, id: &DocumentId) -> Vec<(SourceType, RefreshOutcome)> {
        let settings = self.settings();
        let active = self.active_document();
        let ctx = RefreshContext {
            store: self.store.as_ref(),
            settings: &settings,
            active_document: active.as_ref(),
        };

        let outcomes =
            futures::future::join_all(self.providers().map(|p| p.update_word_index(ctx, id))).await;
        self.providers()
            .iter()
            .map(|p| p.source_type())
            .zip(outcomes)
            .inspect(|(source, outcome)| log_outcome(*source, outcome))
            .collect()
    }

    /// Register a word typed by the user into the custom dictionary index
    pub fn add_dictionary_word(&self, word: Word) -> bool {
        self.custom_dictionary.add_word(word)
    }

    pub fn word_count(&self, source: SourceType) -> usize {
        self.provider(source).word_count()
    }

    /// Current snapshot of every index
    pub fn indexed_words(&self) -> IndexedWords {
        IndexedWords {
            current_document: self.current_document.snapshot(),
            collection: self.collection.snapshot(),
            custom_dictionary: self.custom_dictionary.snapshot(),
            cross_reference: self.cross_reference.snapshot(),
            structured_fields: self.structured_field.snapshots(),
        }
    }

    /// Decide whether `request` should open suggestions
    pub fn trigger(&self, request: &TriggerRequest<'_>) -> Result<TriggerInfo, SuppressReason> {
        let settings = self.settings();
        self.trigger.lock().analyze(request, &settings)
    }

    pub fn suggest(&self, query: &Query) -> Vec<Word> {
        let settings = self.settings();
        let history_enabled = settings.raw.history.enabled;
        let orchestrator = SuggestionOrchestrator::new(settings);
        let indexed = self.indexed_words();
        if history_enabled {
            let history = self.history.lock();
            orchestrator.suggest(query, &indexed, Some(&*history))
        } else {
            orchestrator.suggest(query, &indexed, None)
        }
    }

    /// Accept `word` for `trigger`: record it in the history and plan the edit
    ///
    /// The history is purged after every acceptance and written back once enough
    /// mutations have piled up. Persistence failures are logged, never returned.
    pub async fn select(&self, word: &Word, trigger: &TriggerInfo) -> Replacement {
        let settings = self.settings();
        let replacement = plan_insertion(word, trigger, &settings);

        let history = &settings.raw.history;
        if !history.enabled {
            return replacement;
        }
        let should_persist = {
            let mut store = self.history.lock();
            let context = trigger.query.history_context.as_deref().unwrap_or_default();
            store.increment(word, context);
            let purged = store.purge(history.max_days_to_keep_history, settings.history_max_entries());
            if purged > 0 {
                debug!("Purged {} selection history entries", purged);
            }
            store.should_persist()
        };
        if should_persist {
            if let Err(e) = self.persist_history().await {
                warn!("Failed to persist selection history: {}", e);
            }
        }
        replacement
    }

    /// Complete the last token before the cursor from nearby text
    ///
    /// `before` and `after` are the text on either side of the cursor; the returned
    /// span is relative to the start of `before`.
    pub fn predict(&self, before: &str, after: &str) -> Option<Replacement> {
        let settings = self.settings();
        let token = settings.tokenizer.last_token(before)?;
        if !before.ends_with(token.as_str()) {
            return None;
        }
        let preceding = &before[..before.len() - token.len()];
        let text = predict_from_surroundings(settings.tokenizer.as_ref(), preceding, after, &token)?;
        Some(Replacement {
            start: preceding.len(),
            end: before.len(),
            text,
            caret_offset: None,
        })
    }

    /// Read access to the selection history
    pub fn with_history<R>(&self, f: impl FnOnce(&SelectionHistoryStore) -> R) -> R {
        f(&*self.history.lock())
    }
}

fn log_outcome(source: SourceType, outcome: &RefreshOutcome) {
    match outcome {
        RefreshOutcome::Completed(report) => {
            for skipped in &report.skipped {
                warn!("{} skipped {}: {}", source, skipped.id, skipped.source);
            }
            debug!(
                "{} refreshed: {} words in {:?}",
                source, report.word_count, report.elapsed
            );
        }
        RefreshOutcome::Coalesced => debug!("{} refresh coalesced", source),
        RefreshOutcome::Disabled => debug!("{} disabled", source),
    }
}
