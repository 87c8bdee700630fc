use super::{Token, Tokenizer};

fn is_english_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '\\')
}

/// Keeps runs of ASCII letters, digits, `_`, `-` and `\`; everything else separates
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishOnlyTokenizer;

impl Tokenizer for EnglishOnlyTokenizer {
    fn tokenize(&self, text: &str, _for_trigger: bool) -> Vec<String> {
        text.split(|c: char| !is_english_char(c))
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn recursive_tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = vec![Token::new(text, 0)];
        tokens.extend(
            text.char_indices()
                .filter(|(_, c)| !is_english_char(*c))
                .map(|(i, c)| {
                    let next = i + c.len_utf8();
                    Token::new(&text[next..], next)
                }),
        );
        tokens
    }

    fn is_trim_char(&self, c: char) -> bool {
        !is_english_char(c)
    }
}
