//! Suggestion list owned by the host editor
//!
//! The core never touches editor widgets directly. It drives whatever list the host
//! renders through `SuggestionList`; `InMemorySuggestionList` is a headless
//! implementation for hosts without a UI and for tests.

use parking_lot::Mutex;

use super::word::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

pub trait SuggestionList: Send + Sync {
    /// Replace the displayed candidates and select the first one
    fn show(&self, candidates: Vec<Word>);

    /// Move the highlighted candidate, wrapping around at either end
    fn move_selection(&self, direction: Direction);

    /// Take the highlighted candidate and close the list
    fn accept_selected(&self) -> Option<Word>;

    fn close(&self);

    fn is_open(&self) -> bool;
}

#[derive(Debug, Default)]
struct ListState {
    candidates: Vec<Word>,
    selected: usize,
    open: bool,
}

#[derive(Debug, Default)]
pub struct InMemorySuggestionList {
    state: Mutex<ListState>,
}

impl InMemorySuggestionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates(&self) -> Vec<Word> {
        self.state.lock().candidates.clone()
    }

    pub fn selected(&self) -> Option<Word> {
        let state = self.state.lock();
        state.candidates.get(state.selected).cloned()
    }
}

impl SuggestionList for InMemorySuggestionList {
    fn show(&self, candidates: Vec<Word>) {
        let mut state = self.state.lock();
        state.open = !candidates.is_empty();
        state.candidates = candidates;
        state.selected = 0;
    }

    fn move_selection(&self, direction: Direction) {
        let mut state = self.state.lock();
        let len = state.candidates.len();
        if len == 0 {
            return;
        }
        state.selected = match direction {
            Direction::Down => (state.selected + 1) % len,
            Direction::Up => (state.selected + len - 1) % len,
        };
    }

    fn accept_selected(&self) -> Option<Word> {
        let mut state = self.state.lock();
        if !state.open {
            return None;
        }
        state.open = false;
        let selected = state.selected;
        state.candidates.get(selected).cloned()
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.open = false;
        state.candidates.clear();
        state.selected = 0;
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }
}
