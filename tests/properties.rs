use std::collections::HashSet;
use std::sync::Arc;

use complement_engine::completion::history::SelectionHistoryStore;
use complement_engine::completion::index::{IndexSnapshot, IndexedWords, WordIndex};
use complement_engine::completion::matching::{MatchOptions, partial_match, prefix_match};
use complement_engine::completion::orchestrator::SuggestionOrchestrator;
use complement_engine::completion::word::{Query, SourceType, Word, WordPayload};
use complement_engine::config::Settings;
use complement_engine::tokenizer::Token;
use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

const LETTERS: &[char] = &['a', 'b', 'c', 'd'];

fn small_word(g: &mut Gen) -> String {
    let len = 1 + usize::arbitrary(g) % 6;
    (0..len)
        .map(|_| *g.choose(LETTERS).unwrap_or(&'a'))
        .collect()
}

/// Lowercase words over a tiny alphabet, so prefixes collide often
#[derive(Debug, Clone)]
struct Vocabulary(Vec<String>);

impl Arbitrary for Vocabulary {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 30;
        Vocabulary((0..len).map(|_| small_word(g)).collect())
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Vocabulary))
    }
}

#[derive(Debug, Clone)]
struct Needle(String);

impl Arbitrary for Needle {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut needle = small_word(g);
        needle.truncate(3);
        Needle(needle)
    }
}

/// One recorded selection: context index, value, days before "today"
#[derive(Debug, Clone)]
struct Selection(u8, String, u8);

impl Arbitrary for Selection {
    fn arbitrary(g: &mut Gen) -> Self {
        Selection(u8::arbitrary(g) % 3, small_word(g), u8::arbitrary(g) % 60)
    }
}

const TODAY: i64 = 20_000;

fn doc_word(value: &str) -> Word {
    Word::new(value, WordPayload::CurrentDocument)
}

fn indexed(vocabulary: &Vocabulary) -> IndexedWords {
    IndexedWords {
        current_document: Arc::new(IndexSnapshot::from_words(
            vocabulary.0.iter().map(|v| doc_word(v)),
        )),
        ..IndexedWords::default()
    }
}

fn unique(vocabulary: &Vocabulary) -> Vec<&str> {
    let mut seen = HashSet::new();
    vocabulary
        .0
        .iter()
        .map(String::as_str)
        .filter(|v| seen.insert(*v))
        .collect()
}

fn values(words: &[Word]) -> Vec<&str> {
    words.iter().map(|w| w.value.as_str()).collect()
}

fn quickcheck() -> QuickCheck {
    QuickCheck::new().tests(300).max_tests(3000)
}

#[test]
fn prop_bulk_replace_is_idempotent() {
    fn prop(vocabulary: Vocabulary) -> bool {
        let index = WordIndex::new(SourceType::CurrentDocument);
        index.bulk_replace(vocabulary.0.iter().map(|v| doc_word(v)));
        let first = index.snapshot();
        index.bulk_replace(vocabulary.0.iter().map(|v| doc_word(v)));
        let second = index.snapshot();

        let keys = |s: &Arc<IndexSnapshot>| {
            let mut keys: Vec<char> = s.bucket_keys().copied().collect();
            keys.sort();
            keys
        };
        first.words() == second.words()
            && index.count() == first.len()
            && keys(&first) == keys(&second)
            && keys(&first)
                .iter()
                .all(|k| first.bucket(*k).eq(second.bucket(*k)))
    }
    quickcheck().quickcheck(prop as fn(Vocabulary) -> bool);
}

#[test]
fn prop_prefix_returns_exactly_the_matching_words() {
    fn prop(vocabulary: Vocabulary, needle: Needle) -> TestResult {
        if needle.0.is_empty() {
            return TestResult::discard();
        }
        let words = prefix_match(&indexed(&vocabulary), &needle.0, usize::MAX, &MatchOptions::default());
        let expected: Vec<&str> = unique(&vocabulary)
            .into_iter()
            .filter(|v| v.starts_with(&needle.0))
            .collect();
        TestResult::from_bool(values(&words) == expected)
    }
    quickcheck().quickcheck(prop as fn(Vocabulary, Needle) -> TestResult);
}

#[test]
fn prop_partial_contains_prefix() {
    fn prop(vocabulary: Vocabulary, needle: Needle) -> bool {
        let indexed = indexed(&vocabulary);
        let options = MatchOptions::default();
        let prefix = prefix_match(&indexed, &needle.0, 5, &options);
        let partial: HashSet<String> = partial_match(&indexed, &needle.0, 5, &options)
            .into_iter()
            .map(|w| w.value)
            .collect();
        prefix.iter().all(|w| partial.contains(&w.value))
    }
    quickcheck().quickcheck(prop as fn(Vocabulary, Needle) -> bool);
}

fn orchestrator(fuzzy: bool) -> SuggestionOrchestrator {
    let mut settings = Settings::default();
    settings.trigger.fuzzy_match = fuzzy;
    settings.trigger.max_number_of_suggestions = 50;
    settings.trigger.min_number_of_characters_triggered = 1;
    SuggestionOrchestrator::new(Arc::new(settings.resolve().0))
}

fn query(needles: &[Needle]) -> Query {
    Query::new(needles.iter().map(|n| Token::new(n.0.as_str(), 0)).collect())
}

#[test]
fn prop_orchestrator_output_has_no_duplicates() {
    fn prop(vocabulary: Vocabulary, needles: Vec<Needle>) -> bool {
        let mut indexed = indexed(&vocabulary);
        indexed.collection = Arc::new(IndexSnapshot::from_words(vocabulary.0.iter().map(|v| {
            Word::new(
                v.as_str(),
                WordPayload::Collection {
                    created_path: "a.md".to_string(),
                },
            )
        })));

        let words = orchestrator(true).suggest(&query(&needles), &indexed, None);
        let mut seen = HashSet::new();
        words
            .iter()
            .all(|w| seen.insert((w.value.clone(), w.source_type())))
    }
    quickcheck().quickcheck(prop as fn(Vocabulary, Vec<Needle>) -> bool);
}

#[test]
fn prop_exact_candidates_precede_fuzzy_ones() {
    fn prop(vocabulary: Vocabulary, needles: Vec<Needle>, selections: Vec<Selection>) -> bool {
        let mut store = SelectionHistoryStore::new(10);
        for Selection(_, value, _) in &selections {
            store.increment(&doc_word(value), "ctx");
        }
        let query = query(&needles).with_history_context("ctx");
        let words = orchestrator(true).suggest(&query, &indexed(&vocabulary), Some(&store));
        words.windows(2).all(|pair| !pair[0].fuzzy_matched || pair[1].fuzzy_matched)
    }
    quickcheck().quickcheck(prop as fn(Vocabulary, Vec<Needle>, Vec<Selection>) -> bool);
}

#[test]
fn prop_purge_respects_age_and_size() {
    fn prop(selections: Vec<Selection>, max_age: u8, max_entries: u8) -> bool {
        let mut store = SelectionHistoryStore::new(10);
        for Selection(context, value, days_ago) in &selections {
            store.increment_on(&doc_word(value), &format!("ctx{context}"), TODAY - i64::from(*days_ago));
        }

        let max_age = u32::from(max_age % 40);
        let max_entries = usize::from(max_entries % 20);
        store.purge_with(max_age, Some(max_entries), TODAY);

        let oldest_allowed = TODAY - i64::from(max_age);
        store.len() <= max_entries
            && store
                .export_snapshot()
                .values()
                .flat_map(|values| values.values())
                .flat_map(|sources| sources.values())
                .all(|entry| entry.last_used_epoch_day >= oldest_allowed)
    }
    quickcheck().quickcheck(prop as fn(Vec<Selection>, u8, u8) -> bool);
}

#[test]
fn prop_increment_never_demotes() {
    fn prop(vocabulary: Vocabulary, pick: usize, times: u8) -> TestResult {
        let candidates: Vec<Word> = unique(&vocabulary).into_iter().map(doc_word).collect();
        if candidates.is_empty() {
            return TestResult::discard();
        }
        let target = candidates[pick % candidates.len()].value.clone();
        let rank = |store: &SelectionHistoryStore| {
            store
                .boost(candidates.clone(), "I like")
                .iter()
                .position(|w| w.value == target)
        };

        let mut store = SelectionHistoryStore::new(10);
        for (i, word) in candidates.iter().enumerate() {
            for _ in 0..i % 3 {
                store.increment(word, "I like");
            }
        }
        let before = rank(&store);
        for _ in 0..=times % 5 {
            store.increment(&doc_word(&target), "I like");
        }
        TestResult::from_bool(rank(&store) <= before)
    }
    quickcheck().quickcheck(prop as fn(Vocabulary, usize, u8) -> TestResult);
}
