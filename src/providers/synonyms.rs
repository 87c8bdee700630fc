//! Alternative spellings indexed as aliases
//!
//! A word containing emoji also matches its emoji-free text, and an accented word
//! also matches its unaccented form ("café" is found by "cafe").

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::config::SynonymSettings;

static EMOJI: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"[\p{Extended_Pictographic}\x{FE0F}\x{200D}]").ok());

pub fn strip_emoji(text: &str) -> String {
    match EMOJI.as_ref() {
        Some(pattern) => pattern.replace_all(text, "").trim().to_string(),
        None => text.to_string(),
    }
}

/// NFD-decompose and drop combining marks
pub fn remove_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Aliases to index alongside `value`, excluding `value` itself
pub fn synonym_aliases(value: &str, settings: &SynonymSettings) -> Vec<String> {
    let mut aliases: Vec<String> = Vec::new();
    let mut push = |alias: String| {
        if !alias.is_empty() && alias != value && !aliases.contains(&alias) {
            aliases.push(alias);
        }
    };

    if settings.matching_without_emoji {
        push(strip_emoji(value));
    }
    if settings.treat_accent_diacritics_as_alphabetic_characters {
        push(remove_diacritics(value));
    }
    aliases
}
