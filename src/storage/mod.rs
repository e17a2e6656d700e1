//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - Visited/pending URL sets that let an interrupted crawl resume
//! - Enriched documents and the vocabulary consumed by the search index
//! - SQLite schema management

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{DocumentStore, StateStore, StorageError, StorageResult};

/// An enriched page ready for the document store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// URL path of the page (e.g. "/wiki/Rust")
    pub path: String,

    /// Article heading, if one was found
    pub title: Option<String>,

    /// Normalized tokens in document order
    pub words: Vec<String>,
}
