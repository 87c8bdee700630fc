//! Streaming tokenization with selectable strategies
//!
//! A tokenizer turns raw text into tokens two ways:
//! - `tokenize`: flat list of words, used for indexing documents
//! - `recursive_tokenize`: the whole text followed by every suffix that starts after a
//!   separator, each annotated with its byte offset. Multi-word phrase completion
//!   matches against these suffixes ("I like ap" → "I like ap", "like ap", "ap").
//!
//! Tokenization never fails: malformed or empty input degrades to an empty sequence.
//! Only picking a strategy by name can fail, with `ConfigurationError`.

mod default;
mod english;

pub use default::{ARABIC_TRIM_CHARS, DEFAULT_TRIM_CHARS, PunctuationTokenizer};
pub use english::EnglishOnlyTokenizer;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// A contiguous unit of text cut from a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Byte offset of `text` inside the tokenized string
    pub offset: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            offset,
        }
    }
}

/// Tokenization strategy selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenizeStrategy {
    Default,
    EnglishOnly,
    Arabic,
}

impl TokenizeStrategy {
    pub const ALL: [TokenizeStrategy; 3] = [Self::Default, Self::EnglishOnly, Self::Arabic];

    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| ConfigurationError::UnknownTokenizeStrategy(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::EnglishOnly => "english-only",
            Self::Arabic => "arabic",
        }
    }

    /// Minimum token length before completion may fire automatically
    pub fn trigger_threshold(&self) -> usize {
        match self {
            Self::Default | Self::EnglishOnly | Self::Arabic => 3,
        }
    }

    /// Minimum token length for a word to be indexed at all
    pub fn indexing_threshold(&self) -> usize {
        match self {
            Self::Default | Self::EnglishOnly => 5,
            Self::Arabic => 3,
        }
    }
}

impl fmt::Display for TokenizeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait Tokenizer: Send + Sync + fmt::Debug {
    /// Split `text` into words.
    ///
    /// With `for_trigger` the separators used while typing are applied instead,
    /// which keep spaces inside the returned pieces.
    fn tokenize(&self, text: &str, for_trigger: bool) -> Vec<String>;

    /// The whole text, then every suffix following a separator
    fn recursive_tokenize(&self, text: &str) -> Vec<Token>;

    /// Whether `c` belongs to the trim pattern (punctuation and whitespace separators)
    fn is_trim_char(&self, c: char) -> bool;

    fn last_token(&self, text: &str) -> Option<String> {
        self.tokenize(text, false).pop()
    }

    /// A single character made only of trim-pattern punctuation
    fn is_trim_token(&self, token: &str) -> bool {
        let mut chars = token.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if self.is_trim_char(c))
    }
}

pub fn create_tokenizer(strategy: TokenizeStrategy) -> Arc<dyn Tokenizer> {
    match strategy {
        TokenizeStrategy::Default => Arc::new(PunctuationTokenizer::new(DEFAULT_TRIM_CHARS)),
        TokenizeStrategy::Arabic => Arc::new(PunctuationTokenizer::new(ARABIC_TRIM_CHARS)),
        TokenizeStrategy::EnglishOnly => Arc::new(EnglishOnlyTokenizer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_name() {
        assert_eq!(
            TokenizeStrategy::from_name("english-only").unwrap(),
            TokenizeStrategy::EnglishOnly
        );
        assert!(matches!(
            TokenizeStrategy::from_name("japanese"),
            Err(ConfigurationError::UnknownTokenizeStrategy(name)) if name == "japanese"
        ));
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(TokenizeStrategy::Default.trigger_threshold(), 3);
        assert_eq!(TokenizeStrategy::Default.indexing_threshold(), 5);
        assert_eq!(TokenizeStrategy::Arabic.indexing_threshold(), 3);
    }

    #[test]
    fn test_trim_token() {
        let tokenizer = create_tokenizer(TokenizeStrategy::Default);
        assert!(tokenizer.is_trim_token("("));
        assert!(!tokenizer.is_trim_token("a"));
        assert!(!tokenizer.is_trim_token("(("));
        assert!(!tokenizer.is_trim_token(""));
    }

    #[test]
    fn test_last_token() {
        let tokenizer = create_tokenizer(TokenizeStrategy::Default);
        assert_eq!(tokenizer.last_token("call (apple").as_deref(), Some("apple"));
        assert_eq!(tokenizer.last_token("").as_deref(), None);
    }
}
