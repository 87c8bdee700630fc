//! Async plumbing around the completion core
//!
//! - `debouncer`: latest-wins coalescing of suggestion requests
//! - `refresh_gate`: at most one provider refresh in flight
//! - `history_file`: selection history persistence

pub mod debouncer;
pub mod history_file;
pub mod refresh_gate;

pub use debouncer::Debouncer;
pub use history_file::HistoryFile;
pub use refresh_gate::{RefreshGate, RefreshGuard};
