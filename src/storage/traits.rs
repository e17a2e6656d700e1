//! Storage traits and error types
//!
//! The orchestrator only sees these traits; the SQLite backend is one
//! implementation and tests are free to supply their own.

use crate::storage::Document;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of crawl progress
///
/// Both sets are upsert-only: writing a URL that is already stored is a no-op.
/// Callers treat load failures as empty state and dump failures as
/// non-fatal, so implementations should report errors rather than retry.
pub trait StateStore {
    /// Loads every URL that has been fetched (or attempted) in any run
    fn load_visited(&self) -> StorageResult<HashSet<String>>;

    /// Upserts fetched URLs
    fn dump_visited(&mut self, urls: &[String]) -> StorageResult<usize>;

    /// Loads discovered URLs, in discovery order, without duplicates
    fn load_pending(&self) -> StorageResult<Vec<String>>;

    /// Upserts discovered URLs
    fn dump_pending(&mut self, urls: &[String]) -> StorageResult<usize>;

    /// Removes all visited and pending URLs
    fn clear_state(&mut self) -> StorageResult<()>;
}

/// Persistent store for enriched documents and their vocabulary
pub trait DocumentStore {
    /// Upserts a batch of documents keyed by path
    ///
    /// Returns the number of documents written; the count is only used for logging.
    fn save(&mut self, documents: &[Document]) -> StorageResult<usize>;

    /// Counts stored documents
    fn count_documents(&self) -> StorageResult<u64>;

    /// Counts distinct vocabulary words
    fn count_words(&self) -> StorageResult<u64>;
}
