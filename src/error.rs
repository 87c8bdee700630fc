//! Error taxonomy for the completion engine
//!
//! Three failure families reach callers:
//! - `ConfigurationError`: a setting could not be interpreted. Resolution falls back
//!   to the default and reports the error so hosts can show a notice.
//! - `SourceUnavailable`: one document or dictionary could not be read. The provider
//!   skips it and keeps scanning the remaining sources.
//! - `HistoryError`: the persisted selection history could not be read or written.
//!   A malformed snapshot is treated as an empty history.

use std::io;

use thiserror::Error;

use crate::providers::DocumentId;

/// A setting that could not be interpreted
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unknown tokenize strategy: {0}")]
    UnknownTokenizeStrategy(String),

    #[error("unknown match strategy: {0}")]
    UnknownMatchStrategy(String),

    #[error("unknown structured field match strategy: {0}")]
    UnknownFieldMatchStrategy(String),

    #[error("unknown column delimiter: {0}")]
    UnknownColumnDelimiter(String),

    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A single source document could not be read
#[derive(Debug, Error)]
#[error("source {id} is unavailable: {source}")]
pub struct SourceUnavailable {
    pub id: DocumentId,
    #[source]
    pub source: io::Error,
}

/// Selection history persistence failures
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("history snapshot is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Umbrella error for engine entry points
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Source(#[from] SourceUnavailable),

    #[error(transparent)]
    History(#[from] HistoryError),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
