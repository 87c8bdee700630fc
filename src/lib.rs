//! Incremental multi-source word and phrase completion
//!
//! Providers index words from the current document, the whole document collection,
//! custom dictionaries, cross-reference links and front-matter fields. The completion
//! core matches typed tokens against those indices, ranks the hits with the selection
//! history and turns an accepted candidate into a text replacement.

pub mod backend;
pub mod completion;
pub mod config;
pub mod error;
pub mod logging;
pub mod providers;
pub mod tokenizer;

pub use completion::{CompletionEngine, SuggestionService};
pub use config::{ResolvedSettings, Settings};
pub use error::{EngineError, Result};
