//! SQLite storage implementation
//!
//! This module provides a SQLite-backed implementation of both `StateStore`
//! and `DocumentStore`, sharing one connection.

use crate::enrich::char_bigrams;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, StateStore, StorageResult};
use crate::storage::Document;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`
    ///
    /// Missing parent directories are created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Closes the connection, flushing any pending writes
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    /// Counts rows in the visited table
    pub fn count_visited(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM visited_urls")
    }

    /// Counts rows in the pending table
    pub fn count_pending(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM pending_urls")
    }

    /// Counts pending URLs that have not been visited yet
    pub fn count_outstanding(&self) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM pending_urls
             WHERE url NOT IN (SELECT url FROM visited_urls)",
        )
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn insert_urls(&mut self, sql: &str, urls: &[String]) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(sql)?;
            for url in urls {
                inserted += stmt.execute(params![url, now])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

impl StateStore for SqliteStore {
    fn load_visited(&self) -> StorageResult<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM visited_urls")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(urls)
    }

    fn dump_visited(&mut self, urls: &[String]) -> StorageResult<usize> {
        self.insert_urls(
            "INSERT OR IGNORE INTO visited_urls (url, visited_at) VALUES (?1, ?2)",
            urls,
        )
    }

    fn load_pending(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM pending_urls ORDER BY id ASC")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn dump_pending(&mut self, urls: &[String]) -> StorageResult<usize> {
        self.insert_urls(
            "INSERT OR IGNORE INTO pending_urls (url, discovered_at) VALUES (?1, ?2)",
            urls,
        )
    }

    fn clear_state(&mut self) -> StorageResult<()> {
        self.conn
            .execute_batch("DELETE FROM visited_urls; DELETE FROM pending_urls;")?;
        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    fn save(&mut self, documents: &[Document]) -> StorageResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut doc_stmt = tx.prepare_cached(
                "INSERT INTO documents (path, title, words, saved_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(path) DO UPDATE SET
                    title = excluded.title, words = excluded.words, saved_at = excluded.saved_at",
            )?;
            let mut word_stmt =
                tx.prepare_cached("INSERT OR IGNORE INTO words (word, bigrams) VALUES (?1, ?2)")?;

            let mut seen = HashSet::new();
            for doc in documents {
                let words = serde_json::to_string(&doc.words)?;
                doc_stmt.execute(params![doc.path, doc.title, words, now])?;

                for word in &doc.words {
                    if seen.insert(word.as_str()) {
                        let bigrams = serde_json::to_string(&char_bigrams(word))?;
                        word_stmt.execute(params![word, bigrams])?;
                    }
                }
            }
        }
        tx.commit()?;

        Ok(documents.len())
    }

    fn count_documents(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM documents")
    }

    fn count_words(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM words")
    }
}
