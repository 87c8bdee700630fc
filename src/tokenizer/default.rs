use super::{Token, Tokenizer};

/// Separators for the default word-boundary splitter
pub const DEFAULT_TRIM_CHARS: &[char] = &[
    '\n', '\t', '[', ']', '$', '/', ':', '?', '!', '=', '(', ')', '<', '>', '"', '\'', '.', ',',
    '|', ';', '*', '~', ' ', '`', '_', '“', '„', '«', '»', '‹', '›', '‚', '‘', '’', '”',
];

/// Default separators plus Arabic comma, semicolon and question mark
pub const ARABIC_TRIM_CHARS: &[char] = &[
    '\n', '\t', '[', ']', '/', ':', '?', '!', '=', '(', ')', '<', '>', '"', '\'', '.', ',', '|',
    ';', '*', '~', ' ', '`', '،', '؛', '؟',
];

/// Splits on a fixed set of punctuation and whitespace characters
#[derive(Debug, Clone)]
pub struct PunctuationTokenizer {
    trim_chars: &'static [char],
}

impl PunctuationTokenizer {
    pub fn new(trim_chars: &'static [char]) -> Self {
        Self { trim_chars }
    }

    // While typing, spaces are kept so a phrase survives as one piece.
    fn is_input_trim_char(&self, c: char) -> bool {
        c == '\r' || (c != ' ' && self.trim_chars.contains(&c))
    }
}

impl Tokenizer for PunctuationTokenizer {
    fn tokenize(&self, text: &str, for_trigger: bool) -> Vec<String> {
        let pieces: Vec<&str> = if for_trigger {
            text.split(|c| self.is_input_trim_char(c)).collect()
        } else {
            text.split(|c| self.is_trim_char(c)).collect()
        };

        pieces
            .into_iter()
            .filter(|piece| !piece.is_empty() && *piece != " ")
            .map(|piece| piece.trim_end_matches('.').to_string())
            .filter(|piece| !piece.is_empty())
            .collect()
    }

    fn recursive_tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = vec![Token::new(text, 0)];
        tokens.extend(
            text.char_indices()
                .filter(|(_, c)| self.is_trim_char(*c))
                .map(|(i, c)| {
                    let next = i + c.len_utf8();
                    Token::new(&text[next..], next)
                }),
        );
        tokens
    }

    fn is_trim_char(&self, c: char) -> bool {
        self.trim_chars.contains(&c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> PunctuationTokenizer {
        PunctuationTokenizer::new(DEFAULT_TRIM_CHARS)
    }

    #[test]
    fn test_tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenizer().tokenize("Hello, world! (apple) [[link]]", false),
            vec!["Hello", "world", "apple", "link"]
        );
    }

    #[test]
    fn test_tokenize_for_trigger_keeps_spaces() {
        assert_eq!(
            tokenizer().tokenize("say: I like ap", true),
            vec!["say", " I like ap"]
        );
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(tokenizer().tokenize("", false).is_empty());
        assert!(tokenizer().tokenize("  ,, ", false).is_empty());
    }

    #[test]
    fn test_recursive_tokenize() {
        let tokens = tokenizer().recursive_tokenize("I like ap");
        assert_eq!(
            tokens,
            vec![
                Token::new("I like ap", 0),
                Token::new("like ap", 2),
                Token::new("ap", 7),
            ]
        );
    }

    #[test]
    fn test_recursive_tokenize_multibyte_offsets() {
        let tokens = tokenizer().recursive_tokenize("«café» ok");
        assert_eq!(tokens[1], Token::new("café» ok", "«".len()));
        assert_eq!(tokens.last(), Some(&Token::new("ok", "«café» ".len())));
    }

    #[test]
    fn test_arabic_separators() {
        let tokenizer = PunctuationTokenizer::new(ARABIC_TRIM_CHARS);
        assert_eq!(tokenizer.tokenize("سلام،عليكم", false), vec!["سلام", "عليكم"]);
    }
}
