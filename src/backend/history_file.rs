//! On-disk selection history snapshot
//!
//! The history tree is stored as one pretty-printed JSON document. It is read once at
//! startup and written back whenever the store reports enough unpersisted mutations.
//!
//! # Format
//!
//! ```json
//! { "I like": { "apple": { "currentDocument": { "count": 3, "lastUsedEpochDay": 19876 } } } }
//! ```
//!
//! A missing or malformed file is not fatal: loading falls back to an empty tree.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::completion::history::HistoryTree;
use crate::error::HistoryError;

#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the snapshot
    ///
    /// # Errors
    /// `HistoryError::Io` when the file cannot be read, `HistoryError::Malformed` when
    /// it is not a valid snapshot.
    pub async fn read(&self) -> Result<HistoryTree, HistoryError> {
        let data = fs::read(&self.path).await?;
        let tree: HistoryTree = serde_json::from_slice(&data)?;
        debug!("Loaded {} history contexts from {:?}", tree.len(), self.path);
        Ok(tree)
    }

    /// Read the snapshot, starting fresh when it is missing or malformed
    pub async fn load(&self) -> HistoryTree {
        match self.read().await {
            Ok(tree) => tree,
            Err(HistoryError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No selection history at {:?} (starting fresh)", self.path);
                HistoryTree::new()
            }
            Err(e) => {
                warn!("Ignoring selection history at {:?} (starting fresh): {}", self.path, e);
                HistoryTree::new()
            }
        }
    }

    /// Write the snapshot atomically (temp file, then rename)
    pub async fn save(&self, tree: &HistoryTree) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(tree)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("Persisted {} history contexts to {:?}", tree.len(), self.path);
        Ok(())
    }
}
