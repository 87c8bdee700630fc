//! Word providers
//!
//! Each provider owns one `WordIndex` (the structured-field provider owns one per key),
//! knows how to rescan its source into words, and exposes incremental refresh.
//!
//! Refreshes run as async tasks. At most one refresh per provider is in flight; a
//! refresh requested while another runs returns `RefreshOutcome::Coalesced` and the
//! caller's next trigger rescans current state. A source that cannot be read is
//! skipped and reported in `RefreshReport::skipped`, never aborting the others.

mod collection;
mod cross_reference;
mod current_document;
mod custom_dictionary;
mod path_filter;
mod store;
mod structured_field;
pub mod synonyms;

pub use collection::CollectionProvider;
pub use cross_reference::CrossReferenceProvider;
pub use current_document::CurrentDocumentProvider;
pub use custom_dictionary::{ColumnDelimiter, CustomDictionaryProvider, DictionaryFormat, parse_dictionary_line};
pub use path_filter::PathFilter;
pub use store::{CrossReferenceMap, DocumentStore, FieldMap, FsDocumentStore, parse_front_matter};
pub use structured_field::StructuredFieldProvider;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::completion::word::SourceType;
use crate::config::ResolvedSettings;
use crate::error::SourceUnavailable;

/// Path of a document relative to the store root, `/`-separated, extension included
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path without the trailing extension: `notes/Roadmap.md` → `notes/Roadmap`
    pub fn without_extension(&self) -> &str {
        let name_start = self.0.rfind('/').map_or(0, |i| i + 1);
        match self.0[name_start..].rfind('.') {
            Some(dot) if dot > 0 => &self.0[..name_start + dot],
            _ => &self.0,
        }
    }

    /// File name without extension: `notes/Roadmap.md` → `Roadmap`
    pub fn stem(&self) -> &str {
        let path = self.without_extension();
        path.rfind('/').map_or(path, |i| &path[i + 1..])
    }

    /// Directory part, empty for documents at the root
    pub fn parent(&self) -> &str {
        self.0.rfind('/').map_or("", |i| &self.0[..i])
    }

    /// Whether the document lives in `dir` or one of its subdirectories
    ///
    /// Compares whole path segments, so `notes2/a.md` is not under `notes`.
    pub fn is_under(&self, dir: &str) -> bool {
        let parent = self.parent();
        dir.is_empty()
            || parent == dir
            || parent
                .strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for DocumentId {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Inputs shared by every refresh
#[derive(Clone, Copy)]
pub struct RefreshContext<'a> {
    pub store: &'a dyn DocumentStore,
    pub settings: &'a ResolvedSettings,
    /// Document the cursor is in, if any
    pub active_document: Option<&'a DocumentId>,
}

#[derive(Debug, Default)]
pub struct RefreshReport {
    pub word_count: usize,
    pub skipped: Vec<SourceUnavailable>,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Completed(RefreshReport),
    /// Another refresh of the same provider was already running
    Coalesced,
    /// The source is turned off; its index was cleared
    Disabled,
}

impl RefreshOutcome {
    pub fn report(&self) -> Option<&RefreshReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_coalesced(&self) -> bool {
        matches!(self, Self::Coalesced)
    }
}

#[async_trait]
pub trait WordProvider: Send + Sync {
    fn source_type(&self) -> SourceType;

    /// Full rescan of the source
    async fn refresh_words(&self, ctx: RefreshContext<'_>) -> RefreshOutcome;

    /// Patch the index for one changed document
    ///
    /// Providers without a cheaper path rescan everything.
    async fn update_word_index(&self, ctx: RefreshContext<'_>, _id: &DocumentId) -> RefreshOutcome {
        self.refresh_words(ctx).await
    }

    fn clear_words(&self);

    fn word_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_parts() {
        let id = DocumentId::new("notes/2024/Road.map.md");
        assert_eq!(id.without_extension(), "notes/2024/Road.map");
        assert_eq!(id.stem(), "Road.map");
        assert_eq!(id.parent(), "notes/2024");

        let root = DocumentId::new("README");
        assert_eq!(root.without_extension(), "README");
        assert_eq!(root.stem(), "README");
        assert_eq!(root.parent(), "");

        let hidden = DocumentId::new("dir/.hidden");
        assert_eq!(hidden.stem(), ".hidden");
    }

    #[test]
    fn test_is_under_compares_segments() {
        assert!(DocumentId::new("notes/a.md").is_under("notes"));
        assert!(DocumentId::new("notes/deep/a.md").is_under("notes"));
        assert!(!DocumentId::new("notes2/a.md").is_under("notes"));
        assert!(!DocumentId::new("notes.md").is_under("notes"));
        assert!(DocumentId::new("anything/a.md").is_under(""));
        assert!(!DocumentId::new("a.md").is_under("notes"));
    }
}
