//! Per-query suggestion pipeline
//!
//! For each phrase token of a query: filter by the phrase rules, pick the match
//! strategy (the structured-field override when the cursor is in a field), run it over
//! the index snapshots and tag each hit with the token's offset. The concatenated
//! results are then ranked by `rank_completions`.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::history::SelectionHistoryStore;
use super::index::IndexedWords;
use super::matching::{MatchOptions, MatchStrategy};
use super::ranking::{HistoryBoost, RankingCriteria, rank_completions};
use super::word::{Query, Word};
use crate::config::ResolvedSettings;
use crate::tokenizer::Token;

#[derive(Debug, Clone)]
pub struct SuggestionOrchestrator {
    settings: Arc<ResolvedSettings>,
}

impl SuggestionOrchestrator {
    pub fn new(settings: Arc<ResolvedSettings>) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ResolvedSettings {
        &self.settings
    }

    /// Strategy applied to `query`
    pub fn strategy_for(&self, query: &Query) -> MatchStrategy {
        match query.field_key {
            Some(_) => self
                .settings
                .field_match_strategy
                .resolve(self.settings.match_strategy),
            None => self.settings.match_strategy,
        }
    }

    /// Tokens that take part in matching
    ///
    /// Outside a structured field, token `i` (longest phrase first) survives only when
    /// at least `minNumberOfWordsTriggeredPhrase` tokens remain from it, it reaches the
    /// trigger length and it does not end with a space.
    pub fn matching_tokens<'q>(&self, query: &'q Query) -> Vec<&'q Token> {
        if query.field_key.is_some() {
            return query.tokens.iter().collect();
        }
        let trigger = &self.settings.raw.trigger;
        let min_words = trigger.min_number_of_words_triggered_phrase.max(1);
        let min_chars = self.settings.min_trigger_chars();
        let len = query.tokens.len();

        query
            .tokens
            .iter()
            .enumerate()
            .filter(|(i, token)| {
                min_words + i <= len
                    && token.text.chars().count() >= min_chars
                    && !token.text.ends_with(' ')
            })
            .map(|(_, token)| token)
            .collect()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(tokens = query.tokens.len()))]
    pub fn suggest(
        &self,
        query: &Query,
        indexed: &IndexedWords,
        history: Option<&SelectionHistoryStore>,
    ) -> Vec<Word> {
        let started = Instant::now();
        let trigger = &self.settings.raw.trigger;
        let strategy = self.strategy_for(query);
        let options = MatchOptions {
            field_key: query.field_key.clone(),
            case_sensitive: trigger.case_sensitive,
            fuzzy: self.settings.fuzzy_options(),
            fuzzy_tail: trigger.fuzzy_match,
        };

        let candidates: Vec<Word> = self
            .matching_tokens(query)
            .into_iter()
            .flat_map(|token| {
                strategy
                    .find(indexed, &token.text, trigger.max_number_of_suggestions, &options)
                    .into_iter()
                    .map(move |mut word| {
                        word.offset = token.offset;
                        word
                    })
            })
            .collect();

        let boost = history
            .zip(query.history_context.as_deref())
            .map(|(store, context)| HistoryBoost { store, context });
        let criteria = RankingCriteria {
            max_results: trigger.max_number_of_suggestions,
        };
        let ranked = rank_completions(candidates, boost, &criteria);

        if self.settings.raw.debug.show_log_about_performance {
            debug!("Get suggestions: {}[ms]", started.elapsed().as_millis());
        }
        ranked
    }
}
