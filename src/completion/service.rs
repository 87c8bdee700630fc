//! Debounced front door between editor events and the engine
//!
//! Keystrokes go through `on_input`. Triggers arriving within the configured delay
//! collapse into one suggestion computation for the newest query; the callers whose
//! query was superseded get `None`. A suppressed trigger cancels the pending
//! computation so a stale result can never reopen the list.
//!
//! Every edit the service makes itself (accepting a candidate, predictive completion)
//! closes the list and schedules a second close `CLOSE_GRACE` after the delay. The
//! edit fires its own trigger, and the list it reopens must not linger.
//!
//! Both debouncers are built from the settings snapshot; `update_settings` rebuilds
//! them so a new delay or edge mode applies to the next input.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::engine::CompletionEngine;
use super::host::{Direction, SuggestionList};
use super::insertion::Replacement;
use super::trigger::{TriggerInfo, TriggerRequest};
use super::word::{Query, Word};
use crate::backend::Debouncer;
use crate::config::{ResolvedSettings, Settings};
use crate::error::ConfigurationError;

/// Extra delay of the close debounce on top of the suggestion delay
pub const CLOSE_GRACE: Duration = Duration::from_millis(50);

struct Debouncers {
    suggestions: Debouncer<Query, Vec<Word>>,
    closer: Debouncer<(), ()>,
}

impl Debouncers {
    fn new(
        engine: &Arc<CompletionEngine>,
        list: &Arc<dyn SuggestionList>,
        settings: &ResolvedSettings,
    ) -> Self {
        let delay = Duration::from_millis(settings.raw.trigger.delay_milli_seconds);

        let suggest_engine = engine.clone();
        let suggestions = Debouncer::new(delay, settings.raw.trigger.leading_edge, move |query: Query| {
            let engine = suggest_engine.clone();
            async move { engine.suggest(&query) }
        });

        let close_list = list.clone();
        let closer = Debouncer::new(delay + CLOSE_GRACE, false, move |()| {
            let list = close_list.clone();
            async move { list.close() }
        });

        Self {
            suggestions,
            closer,
        }
    }
}

pub struct SuggestionService {
    engine: Arc<CompletionEngine>,
    list: Arc<dyn SuggestionList>,
    debouncers: Mutex<Debouncers>,
}

impl SuggestionService {
    /// Must be called inside a tokio runtime; delays are taken from the current settings
    pub fn new(engine: Arc<CompletionEngine>, list: Arc<dyn SuggestionList>) -> Self {
        let debouncers = Debouncers::new(&engine, &list, &engine.settings());
        Self {
            engine,
            list,
            debouncers: Mutex::new(debouncers),
        }
    }

    pub fn engine(&self) -> &CompletionEngine {
        &self.engine
    }

    /// Apply new settings to the engine and rebuild the debouncers from them
    ///
    /// Pending computations are dropped; their callers observe a superseded input.
    /// Must be called inside a tokio runtime.
    pub fn update_settings(&self, settings: &Settings) -> Vec<ConfigurationError> {
        let errors = self.engine.update_settings(settings);
        let rebuilt = Debouncers::new(&self.engine, &self.list, &self.engine.settings());
        *self.debouncers.lock() = rebuilt;
        debug!(
            "Suggestion debounce rebuilt: {}ms, leading edge {}",
            settings.trigger.delay_milli_seconds, settings.trigger.leading_edge
        );
        errors
    }

    /// Analyze the edited line and show the suggestions for it
    ///
    /// Returns `None` when the trigger is suppressed or a newer input superseded this one.
    pub async fn on_input(&self, request: TriggerRequest<'_>) -> Option<(TriggerInfo, Vec<Word>)> {
        let info = match self.engine.trigger(&request) {
            Ok(info) => info,
            Err(reason) => {
                trace!("Trigger suppressed: {:?}", reason);
                self.debouncers.lock().suggestions.cancel();
                self.list.close();
                return None;
            }
        };

        let receiver = self.debouncers.lock().suggestions.call(info.query.clone());
        let Ok(words) = receiver.await else {
            trace!("Suggestion request superseded");
            return None;
        };
        self.list.show(words.clone());
        Some((info, words))
    }

    pub fn move_selection(&self, direction: Direction) {
        self.list.move_selection(direction);
    }

    /// Accept the highlighted candidate, if the list is open
    pub async fn accept(&self, trigger: &TriggerInfo) -> Option<Replacement> {
        let word = self.list.accept_selected()?;
        let replacement = self.engine.select(&word, trigger).await;
        self.close_after_edit();
        Some(replacement)
    }

    /// Complete the token before the cursor from nearby text
    ///
    /// `before` and `after` are the text on either side of the cursor.
    pub fn predict(&self, before: &str, after: &str) -> Option<Replacement> {
        let replacement = self.engine.predict(before, after)?;
        self.close_after_edit();
        Some(replacement)
    }

    /// Close the list and drop any pending computation
    pub fn close(&self) {
        self.debouncers.lock().suggestions.cancel();
        self.list.close();
    }

    fn close_after_edit(&self) {
        self.list.close();
        drop(self.debouncers.lock().closer.call(()));
    }
}
