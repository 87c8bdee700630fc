//! Completion candidates and queries
//!
//! A `Word` is a value object: providers build fresh words on every rescan and drop
//! the old ones when the index is replaced. The per-source data lives in
//! `WordPayload`, a tagged union dispatched on `SourceType`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tokenizer::Token;

/// Origin category of a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceType {
    CurrentDocument,
    Collection,
    CustomDictionary,
    CrossReference,
    StructuredField,
}

impl SourceType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CurrentDocument => "currentDocument",
            Self::Collection => "collection",
            Self::CustomDictionary => "customDictionary",
            Self::CrossReference => "crossReference",
            Self::StructuredField => "structuredField",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Alias of a linked document, pointing back at the document it names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AliasInfo {
    /// Document the alias was declared in
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WordPayload {
    CurrentDocument,
    Collection {
        created_path: String,
    },
    CustomDictionary {
        /// Text inserted instead of `value` (hidden suffix or caret marker present)
        inserted_text: Option<String>,
        hide_delimiter: Option<String>,
        caret_marker: Option<String>,
        ignore_space_after_insertion: bool,
    },
    CrossReference {
        created_path: String,
        /// The link target does not exist yet
        phantom: bool,
        alias_info: Option<AliasInfo>,
    },
    StructuredField {
        key: String,
        created_path: String,
    },
}

impl WordPayload {
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::CurrentDocument => SourceType::CurrentDocument,
            Self::Collection { .. } => SourceType::Collection,
            Self::CustomDictionary { .. } => SourceType::CustomDictionary,
            Self::CrossReference { .. } => SourceType::CrossReference,
            Self::StructuredField { .. } => SourceType::StructuredField,
        }
    }
}

/// An indexed completion candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    pub value: String,
    pub description: Option<String>,
    /// Alternative spellings that also match this word (dictionary aliases, synonyms)
    pub aliases: Vec<String>,
    /// Accepted through approximate similarity rather than prefix/substring
    pub fuzzy_matched: bool,
    /// Byte offset of the query token this candidate answers, relative to the first token
    pub offset: usize,
    /// Spelling in the index when `value` was recapitalised for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_value: Option<String>,
    pub payload: WordPayload,
}

impl Word {
    pub fn new(value: impl Into<String>, payload: WordPayload) -> Self {
        Self {
            value: value.into(),
            description: None,
            aliases: Vec::new(),
            fuzzy_matched: false,
            offset: 0,
            indexed_value: None,
            payload,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn source_type(&self) -> SourceType {
        self.payload.source_type()
    }

    /// Identity used for deduplication across match results
    pub fn dedup_key(&self) -> (&str, SourceType) {
        (self.value.as_str(), self.source_type())
    }

    /// Value under which selections are recorded, independent of display casing
    pub fn history_key(&self) -> &str {
        self.indexed_value.as_deref().unwrap_or(&self.value)
    }

    /// Value followed by aliases
    pub fn match_targets(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.value.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Parsed multi-token query for one trigger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Structured field key the cursor is in, if any
    pub field_key: Option<String>,
    pub tokens: Vec<Token>,
    /// Text preceding the completion, used as the selection history key
    pub history_context: Option<String>,
}

impl Query {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    pub fn with_field_key(mut self, key: impl Into<String>) -> Self {
        self.field_key = Some(key.into());
        self
    }

    pub fn with_history_context(mut self, context: impl Into<String>) -> Self {
        self.history_context = Some(context.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_follows_payload() {
        let word = Word::new(
            "Roadmap",
            WordPayload::CrossReference {
                created_path: "Roadmap.md".to_string(),
                phantom: false,
                alias_info: None,
            },
        );
        assert_eq!(word.source_type(), SourceType::CrossReference);
        assert_eq!(word.dedup_key(), ("Roadmap", SourceType::CrossReference));
    }

    #[test]
    fn test_match_targets_include_aliases() {
        let word = Word::new("café", WordPayload::CurrentDocument).with_aliases(vec!["cafe".into()]);
        assert_eq!(word.match_targets().collect::<Vec<_>>(), vec!["café", "cafe"]);
    }

    #[test]
    fn test_history_key_prefers_indexed_spelling() {
        let mut word = Word::new("Apple", WordPayload::CurrentDocument);
        assert_eq!(word.history_key(), "Apple");
        word.indexed_value = Some("apple".to_string());
        assert_eq!(word.history_key(), "apple");
    }
}
