//! Document access
//!
//! Providers read documents through `DocumentStore`; hosts plug in their own. The
//! bundled `FsDocumentStore` serves markdown files under a root directory: a leading
//! `---` block is read as front-matter fields and `[[target]]` / `[[target|label]]`
//! occurrences become cross-references.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::DocumentId;

/// Front-matter field name → values
pub type FieldMap = BTreeMap<String, Vec<String>>;

/// Links between documents, keyed by the linking document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossReferenceMap {
    /// Links whose target exists
    pub resolved: BTreeMap<DocumentId, BTreeSet<DocumentId>>,
    /// Link texts with no matching document
    pub unresolved: BTreeMap<DocumentId, BTreeSet<String>>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document, in a stable order
    async fn list_documents(&self) -> io::Result<Vec<DocumentId>>;

    async fn read_text(&self, id: &DocumentId) -> io::Result<String>;

    async fn fields(&self, id: &DocumentId) -> io::Result<FieldMap> {
        Ok(parse_front_matter(&self.read_text(id).await?))
    }

    async fn link_graph(&self) -> io::Result<CrossReferenceMap>;
}

/// Markdown documents under a directory
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, id: &DocumentId) -> PathBuf {
        self.root.join(id.as_str())
    }
}

fn scan_markdown(root: &Path) -> Vec<DocumentId> {
    let mut ids: Vec<DocumentId> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "md"))
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            Some(DocumentId::new(parts.join("/")))
        })
        .collect();
    ids.sort();
    ids
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn list_documents(&self) -> io::Result<Vec<DocumentId>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || scan_markdown(&root))
            .await
            .map_err(io::Error::other)
    }

    async fn read_text(&self, id: &DocumentId) -> io::Result<String> {
        tokio::fs::read_to_string(self.path_of(id)).await
    }

    async fn link_graph(&self) -> io::Result<CrossReferenceMap> {
        let documents = self.list_documents().await?;
        let by_path: BTreeMap<&str, &DocumentId> =
            documents.iter().map(|id| (id.without_extension(), id)).collect();
        let mut by_stem: BTreeMap<&str, &DocumentId> = BTreeMap::new();
        for id in &documents {
            by_stem.entry(id.stem()).or_insert(id);
        }

        let mut map = CrossReferenceMap::default();
        for source in &documents {
            let text = match self.read_text(source).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping links of {}: {}", source, e);
                    continue;
                }
            };
            for target in extract_links(&text) {
                let trimmed = target.strip_suffix(".md").unwrap_or(&target);
                match by_path.get(trimmed).or_else(|| by_stem.get(trimmed)) {
                    Some(id) => {
                        map.resolved.entry(source.clone()).or_default().insert((*id).clone());
                    }
                    None => {
                        map.unresolved.entry(source.clone()).or_default().insert(trimmed.to_string());
                    }
                }
            }
        }
        debug!(
            "Link graph: {} linking documents, {} with unresolved links",
            map.resolved.len(),
            map.unresolved.len()
        );
        Ok(map)
    }
}

/// Targets of `[[...]]` links, without labels or heading anchors
pub fn extract_links(text: &str) -> Vec<String> {
    let mut links = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("[[") {
        rest = &rest[start + 2..];
        let Some(end) = rest.find("]]") else {
            break;
        };
        let inner = &rest[..end];
        rest = &rest[end + 2..];
        if inner.contains('\n') {
            continue;
        }
        let target = inner
            .split(['|', '#', '^'])
            .next()
            .unwrap_or_default()
            .trim();
        if !target.is_empty() {
            links.push(target.to_string());
        }
    }
    links
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    value
}

fn split_values(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .unwrap_or(raw);
    raw.split(',')
        .map(unquote)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the leading `---` block into fields
///
/// Supports `key: value`, `key: a, b`, `key: [a, b]` and block lists (`key:` followed
/// by `- item` lines). Anything else is ignored.
pub fn parse_front_matter(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    let mut lines = text.lines();
    if lines.next().map(str::trim_end) != Some("---") {
        return fields;
    }

    let mut current: Option<String> = None;
    for line in lines {
        if line.trim_end() == "---" {
            return fields;
        }
        if let Some(item) = line.trim_start().strip_prefix("- ") {
            if let Some(key) = &current {
                let item = unquote(item);
                if !item.is_empty() {
                    fields.entry(key.clone()).or_default().push(item.to_string());
                }
            }
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            current = None;
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.starts_with('#') {
            current = None;
            continue;
        }
        let values = split_values(value);
        current = values.is_empty().then(|| key.to_string());
        fields.entry(key.to_string()).or_default().extend(values);
    }

    // Unterminated block: not front matter
    FieldMap::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_front_matter_forms() {
        let text = indoc! {r#"
            ---
            title: "Weekly review"
            tags: [rust, "completion"]
            aliases: review, retro
            owners:
              - alice
              - 'bob'
            ---
            body: not a field
        "#};
        let fields = parse_front_matter(text);
        assert_eq!(fields["title"], vec!["Weekly review"]);
        assert_eq!(fields["tags"], vec!["rust", "completion"]);
        assert_eq!(fields["aliases"], vec!["review", "retro"]);
        assert_eq!(fields["owners"], vec!["alice", "bob"]);
        assert!(!fields.contains_key("body"));
    }

    #[test]
    fn test_parse_front_matter_requires_block() {
        assert!(parse_front_matter("title: x\n").is_empty());
        assert!(parse_front_matter("---\ntitle: x\n").is_empty());
    }

    #[test]
    fn test_extract_links() {
        let links = extract_links("see [[Roadmap]], [[notes/Plan|the plan]] and [[Spec#Scope]] [[]]");
        assert_eq!(links, vec!["Roadmap", "notes/Plan", "Spec"]);
    }

    #[tokio::test]
    async fn test_fs_store_lists_markdown_and_links() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        fs::create_dir_all(dir.path().join(".trash")).unwrap();
        fs::write(dir.path().join("Index.md"), "[[Roadmap]] [[Missing note]] [[notes/Plan]]").unwrap();
        fs::write(dir.path().join("notes/Roadmap.md"), "roadmap").unwrap();
        fs::write(dir.path().join("notes/Plan.md"), "plan").unwrap();
        fs::write(dir.path().join("notes/image.png"), "").unwrap();
        fs::write(dir.path().join(".trash/Old.md"), "").unwrap();

        let store = FsDocumentStore::new(dir.path());
        let documents = store.list_documents().await.unwrap();
        assert_eq!(
            documents,
            vec![
                DocumentId::new("Index.md"),
                DocumentId::new("notes/Plan.md"),
                DocumentId::new("notes/Roadmap.md"),
            ]
        );

        let graph = store.link_graph().await.unwrap();
        let index = DocumentId::new("Index.md");
        assert_eq!(
            graph.resolved[&index],
            BTreeSet::from([DocumentId::new("notes/Plan.md"), DocumentId::new("notes/Roadmap.md")])
        );
        assert_eq!(graph.unresolved[&index], BTreeSet::from(["Missing note".to_string()]));
    }

    #[tokio::test]
    async fn test_fs_store_missing_document() {
        let dir = TempDir::new().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let err = store.read_text(&DocumentId::new("nope.md")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
