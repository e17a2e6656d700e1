//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Wiki-Trawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- URLs that have been fetched (or attempted)
CREATE TABLE IF NOT EXISTS visited_urls (
    url TEXT PRIMARY KEY,
    visited_at TEXT NOT NULL
);

-- URLs discovered and accepted for crawling; rowid preserves discovery order
CREATE TABLE IF NOT EXISTS pending_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    discovered_at TEXT NOT NULL
);

-- Enriched documents
CREATE TABLE IF NOT EXISTS documents (
    path TEXT PRIMARY KEY,
    title TEXT,
    words TEXT NOT NULL,
    saved_at TEXT NOT NULL
);

-- Vocabulary with character bigrams for approximate matching
CREATE TABLE IF NOT EXISTS words (
    word TEXT PRIMARY KEY,
    bigrams TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// Safe to run against an existing database; every statement is `IF NOT EXISTS`.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
