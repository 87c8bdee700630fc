//! Trigger analysis
//!
//! Decides, for the line text up to the cursor, whether completion should fire and
//! builds the `Query` for it. Suppression checks run in a fixed order:
//!
//! 1. automatic completion is off and the request is not manual
//! 2. the line is unchanged since the previous trigger (unless manual or in a field)
//! 3. the line starts with `---`
//! 4. a suppress pattern matches the text before the cursor
//! 5. no token under the cursor
//! 6. the last whitespace-separated chunk is unchanged (unless manual)
//! 7. that chunk starts with one of the disabling first characters
//! 8. the current token is a single separator character
//! 9. the current token is shorter than the trigger threshold (unless manual or in a field)
//!
//! All positions are byte offsets into the line.

use std::fmt;

use tracing::trace;

use super::word::Query;
use crate::config::ResolvedSettings;
use crate::tokenizer::{Token, Tokenizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRequest<'a> {
    /// Whole current line
    pub line: &'a str,
    /// Byte offset of the cursor within `line`
    pub cursor: usize,
    /// Explicitly requested by the user
    pub manual: bool,
    /// Structured field the cursor is in, if any
    pub field_key: Option<&'a str>,
}

impl<'a> TriggerRequest<'a> {
    pub fn new(line: &'a str, cursor: usize) -> Self {
        Self {
            line,
            cursor,
            manual: false,
            field_key: None,
        }
    }

    pub fn manual(mut self) -> Self {
        self.manual = true;
        self
    }

    pub fn in_field(mut self, key: &'a str) -> Self {
        self.field_key = Some(key);
        self
    }

    fn until_cursor(&self) -> &'a str {
        self.line.get(..self.cursor).unwrap_or(self.line)
    }
}

/// Where a completion applies and what to search for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerInfo {
    /// Start of the replaced span (beginning of the last token)
    pub start: usize,
    /// End of the replaced span (the cursor)
    pub end: usize,
    /// Beginning of the longest phrase token; candidate offsets are relative to it
    pub context_start: usize,
    pub query: Query,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressReason {
    NotAutomatic,
    LineUnchanged,
    FrontMatterDelimiter,
    SuppressedByPattern(String),
    EmptyToken,
    ChunkUnchanged,
    DisabledFirstCharacter(char),
    SeparatorOnly,
    TooShort { length: usize, minimum: usize },
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAutomatic => write!(f, "automatic completion is off"),
            Self::LineUnchanged => write!(f, "line has not changed"),
            Self::FrontMatterDelimiter => write!(f, "line starts with a front matter delimiter"),
            Self::SuppressedByPattern(p) => write!(f, "suppressed by pattern {p}"),
            Self::EmptyToken => write!(f, "no token under the cursor"),
            Self::ChunkUnchanged => write!(f, "current chunk has not changed"),
            Self::DisabledFirstCharacter(c) => write!(f, "chunk starts with {c:?}"),
            Self::SeparatorOnly => write!(f, "token is a single separator"),
            Self::TooShort { length, minimum } => {
                write!(f, "token length {length} is below {minimum}")
            }
        }
    }
}

/// Stateful trigger filter; remembers the previous line and chunk
#[derive(Debug, Clone, Default)]
pub struct TriggerAnalyzer {
    previous_line: Option<String>,
    previous_chunk: Option<String>,
}

impl TriggerAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous line and chunk, e.g. after the active document changes
    pub fn reset(&mut self) {
        self.previous_line = None;
        self.previous_chunk = None;
    }

    pub fn analyze(
        &mut self,
        request: &TriggerRequest<'_>,
        settings: &ResolvedSettings,
    ) -> Result<TriggerInfo, SuppressReason> {
        let result = self.evaluate(request, settings);
        if let Err(reason) = &result {
            trace!("Trigger suppressed: {}", reason);
        }
        result
    }

    fn evaluate(
        &mut self,
        request: &TriggerRequest<'_>,
        settings: &ResolvedSettings,
    ) -> Result<TriggerInfo, SuppressReason> {
        let trigger = &settings.raw.trigger;
        let in_field = request.field_key.is_some();

        if !trigger.complement_automatically && !request.manual {
            return Err(SuppressReason::NotAutomatic);
        }

        let unchanged = self.previous_line.as_deref() == Some(request.line);
        self.previous_line = Some(request.line.to_string());
        if unchanged && !request.manual && !in_field {
            return Err(SuppressReason::LineUnchanged);
        }

        let text = request.until_cursor();
        if text.starts_with("---") {
            return Err(SuppressReason::FrontMatterDelimiter);
        }
        if let Some(pattern) = settings.suppress_patterns.iter().find(|p| p.is_match(text)) {
            return Err(SuppressReason::SuppressedByPattern(pattern.as_str().to_string()));
        }

        let tokenized = settings.tokenizer.recursive_tokenize(text);
        let keep_from = tokenized
            .len()
            .saturating_sub(trigger.max_number_of_words_as_phrase.max(1));
        let mut tokens: Vec<Token> = tokenized.into_iter().skip(keep_from).collect();
        let current = match tokens.first() {
            Some(token) if !token.text.is_empty() => token.text.clone(),
            _ => return Err(SuppressReason::EmptyToken),
        };

        let chunk = text.rsplit(' ').next().unwrap_or_default();
        if self.previous_chunk.as_deref() == Some(chunk) && !request.manual {
            return Err(SuppressReason::ChunkUnchanged);
        }
        self.previous_chunk = Some(chunk.to_string());
        if let Some(c) = chunk
            .chars()
            .next()
            .filter(|c| trigger.first_characters_disable_suggestions.contains(*c))
        {
            return Err(SuppressReason::DisabledFirstCharacter(c));
        }

        if settings.tokenizer.is_trim_token(&current) {
            return Err(SuppressReason::SeparatorOnly);
        }

        let minimum = settings.min_trigger_chars();
        let length = current.chars().count();
        if !request.manual && !in_field && length < minimum {
            return Err(SuppressReason::TooShort { length, minimum });
        }

        if in_field && tokens.last().is_some_and(|t| ends_with_word_then_space(&t.text)) {
            tokens.push(Token::new("", text.len()));
        }

        let base = tokens[0].offset;
        for token in &mut tokens {
            token.offset -= base;
        }

        let last_len = tokens.last().map_or(0, |t| t.text.len());
        let start = text.len() - last_len;
        let context_start = text.len() - current.len();
        let history_context = context_signature(&text[..start], settings.raw.history.context_tokens);

        let mut query = Query::new(tokens).with_history_context(history_context);
        if let Some(key) = request.field_key {
            query = query.with_field_key(key);
        }
        Ok(TriggerInfo {
            start,
            end: text.len(),
            context_start,
            query,
        })
    }
}

fn ends_with_word_then_space(text: &str) -> bool {
    let mut chars = text.chars().rev();
    matches!((chars.next(), chars.next()), (Some(' '), Some(c)) if c != ' ')
}

/// Last `count` whitespace-separated words of `text`, joined by single spaces
pub fn context_signature(text: &str, count: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    words[words.len().saturating_sub(count)..].join(" ")
}

/// Nearest word around the cursor that extends `token`
///
/// Words before the cursor are searched backwards first, then words after it.
pub fn predict_from_surroundings(
    tokenizer: &dyn Tokenizer,
    before: &str,
    after: &str,
    token: &str,
) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    let extends = |word: &String| word.starts_with(token) && word != token;
    if let Some(word) = tokenizer.tokenize(before, false).iter().rev().find(|w| extends(w)) {
        return Some(word.clone());
    }
    tokenizer.tokenize(after, false).into_iter().find(|w| extends(w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::tokenizer::{TokenizeStrategy, create_tokenizer};

    fn analyze(text: &str) -> Result<TriggerInfo, SuppressReason> {
        let settings = ResolvedSettings::default();
        TriggerAnalyzer::new().analyze(&TriggerRequest::new(text, text.len()), &settings)
    }

    #[test]
    fn test_phrase_query() {
        let info = analyze("I like ap").unwrap();
        assert_eq!((info.start, info.end, info.context_start), (7, 9, 0));
        assert_eq!(
            info.query.tokens,
            vec![Token::new("I like ap", 0), Token::new("like ap", 2), Token::new("ap", 7)]
        );
        assert_eq!(info.query.history_context.as_deref(), Some("I like"));
        assert_eq!(info.query.field_key, None);
    }

    #[test]
    fn test_phrase_length_limit_rebases_offsets() {
        let mut settings = Settings::default();
        settings.trigger.max_number_of_words_as_phrase = 2;
        let (settings, _) = settings.resolve();

        let text = "we all like ap";
        let info = TriggerAnalyzer::new()
            .analyze(&TriggerRequest::new(text, text.len()), &settings)
            .unwrap();
        assert_eq!(info.query.tokens, vec![Token::new("like ap", 0), Token::new("ap", 5)]);
        assert_eq!(info.context_start, 7);
        assert_eq!(info.start, 12);
    }

    #[test]
    fn test_cursor_inside_line() {
        let line = "apple pie";
        let info = analyze_request(TriggerRequest::new(line, 3)).unwrap();
        assert_eq!(info.query.tokens, vec![Token::new("app", 0)]);
        assert_eq!((info.start, info.end), (0, 3));
    }

    fn analyze_request(request: TriggerRequest<'_>) -> Result<TriggerInfo, SuppressReason> {
        TriggerAnalyzer::new().analyze(&request, &ResolvedSettings::default())
    }

    #[test]
    fn test_unchanged_line_is_suppressed_unless_manual() {
        let settings = ResolvedSettings::default();
        let mut analyzer = TriggerAnalyzer::new();
        let request = TriggerRequest::new("apple", 5);

        assert!(analyzer.analyze(&request, &settings).is_ok());
        assert_eq!(
            analyzer.analyze(&request, &settings),
            Err(SuppressReason::LineUnchanged)
        );
        assert!(analyzer.analyze(&request.manual(), &settings).is_ok());
    }

    #[test]
    fn test_suppression_chain() {
        assert_eq!(analyze("---"), Err(SuppressReason::FrontMatterDelimiter));
        assert!(matches!(analyze("```rust"), Err(SuppressReason::SuppressedByPattern(_))));
        assert_eq!(analyze(":emo"), Err(SuppressReason::DisabledFirstCharacter(':')));
        assert_eq!(analyze("("), Err(SuppressReason::SeparatorOnly));
        assert_eq!(analyze("ap"), Err(SuppressReason::TooShort { length: 2, minimum: 3 }));
        assert_eq!(analyze(""), Err(SuppressReason::EmptyToken));
    }

    #[test]
    fn test_manual_and_field_bypass_minimum() {
        assert!(analyze_request(TriggerRequest::new("ap", 2).manual()).is_ok());

        let info = analyze_request(TriggerRequest::new("ap", 2).in_field("tags")).unwrap();
        assert_eq!(info.query.field_key.as_deref(), Some("tags"));
    }

    #[test]
    fn test_not_automatic() {
        let mut settings = Settings::default();
        settings.trigger.complement_automatically = false;
        let (settings, _) = settings.resolve();

        let mut analyzer = TriggerAnalyzer::new();
        assert_eq!(
            analyzer.analyze(&TriggerRequest::new("apple", 5), &settings),
            Err(SuppressReason::NotAutomatic)
        );
        assert!(analyzer.analyze(&TriggerRequest::new("apple", 5).manual(), &settings).is_ok());
    }

    #[test]
    fn test_context_signature() {
        assert_eq!(context_signature("we all  like ", 2), "all like");
        assert_eq!(context_signature("like", 0), "");
        assert_eq!(context_signature("", 2), "");
    }

    #[test]
    fn test_predict_from_surroundings() {
        let tokenizer = create_tokenizer(TokenizeStrategy::Default);
        assert_eq!(
            predict_from_surroundings(tokenizer.as_ref(), "the completion engine com", "", "com").as_deref(),
            Some("completion")
        );
        assert_eq!(
            predict_from_surroundings(tokenizer.as_ref(), "a com", "b compiler", "com").as_deref(),
            Some("compiler")
        );
        assert_eq!(predict_from_surroundings(tokenizer.as_ref(), "com", "", "com"), None);
    }
}
