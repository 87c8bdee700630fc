//! Turning a chosen candidate into a text replacement

use serde::{Deserialize, Serialize};

use super::trigger::TriggerInfo;
use super::word::{Word, WordPayload};
use crate::config::ResolvedSettings;
use crate::providers::DocumentId;

/// Edit the host applies to the current line when a candidate is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// Byte offset in the line where the replaced span begins
    pub start: usize,
    /// Byte offset where the replaced span ends (the cursor)
    pub end: usize,
    pub text: String,
    /// Cursor position after insertion, relative to `start`
    pub caret_offset: Option<usize>,
}

impl Replacement {
    /// Absolute cursor column once the replacement is applied
    pub fn cursor_after(&self) -> usize {
        self.start + self.caret_offset.unwrap_or(self.text.len())
    }
}

pub fn plan_insertion(word: &Word, trigger: &TriggerInfo, settings: &ResolvedSettings) -> Replacement {
    let mut text = match &word.payload {
        WordPayload::CrossReference { .. } => link_text(word, settings),
        _ => word.value.clone(),
    };

    let suffix = match &word.payload {
        WordPayload::StructuredField { .. }
            if settings.raw.structured_field.insert_comma_after_completion =>
        {
            Some(", ")
        }
        WordPayload::CustomDictionary {
            ignore_space_after_insertion: true,
            ..
        } => None,
        _ => settings.raw.trigger.insert_space_after_completion.then_some(" "),
    };
    if let Some(suffix) = suffix {
        text.push_str(suffix);
    }

    let mut caret_offset = None;
    if let WordPayload::CustomDictionary {
        inserted_text,
        caret_marker,
        ..
    } = &word.payload
    {
        if let Some(inserted) = inserted_text {
            text = inserted.clone();
        }
        let marker = caret_marker.as_deref().filter(|m| !m.is_empty());
        if let Some((index, marker)) = marker.and_then(|m| text.find(m).map(|i| (i, m.len()))) {
            text.replace_range(index..index + marker, "");
            caret_offset = Some(index);
        }
    }

    Replacement {
        start: (trigger.context_start + word.offset).min(trigger.end),
        end: trigger.end,
        text,
        caret_offset,
    }
}

fn link_text(word: &Word, settings: &ResolvedSettings) -> String {
    let WordPayload::CrossReference {
        created_path,
        phantom,
        alias_info,
    } = &word.payload
    else {
        return word.value.clone();
    };
    let wiki = settings.raw.cross_reference.use_wiki_links;

    if let Some(alias) = alias_info.as_ref().filter(|_| settings.raw.cross_reference.suggest_with_alias) {
        let target = DocumentId::from(alias.origin.as_str());
        return if wiki {
            format!("[[{}|{}]]", target.without_extension(), word.value)
        } else {
            format!("[{}]({}.md)", word.value, encode_spaces(target.without_extension()))
        };
    }

    let created = DocumentId::from(created_path.as_str());
    let target = if *phantom {
        word.value.as_str()
    } else {
        created.without_extension()
    };
    if wiki {
        format!("[[{target}]]")
    } else {
        format!("[{}]({}.md)", word.value, encode_spaces(target))
    }
}

fn encode_spaces(path: &str) -> String {
    path.replace(' ', "%20")
}

/// Longest prefix shared by every candidate extending `token`
///
/// Candidates are matched case-insensitively; `None` when nothing is longer than the token.
pub fn common_prefix(words: &[Word], token: &str) -> Option<String> {
    let lowered = token.to_lowercase();
    let mut candidates = words
        .iter()
        .map(|w| w.value.as_str())
        .filter(|v| v.to_lowercase().starts_with(&lowered));

    let first = candidates.next()?;
    let mut shared = first.len();
    for value in candidates {
        shared = first
            .char_indices()
            .zip(value.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(shared);
    }

    let prefix = &first[..shared];
    (prefix.chars().count() > token.chars().count()).then(|| prefix.to_string())
}
