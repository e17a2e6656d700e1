//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! persisted crawl state and document counts.

use crate::storage::{DocumentStore, SqliteStore, StorageResult};

/// Database statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// URLs fetched (or attempted) across all runs
    pub visited: u64,

    /// URLs ever accepted into the pending set
    pub pending: u64,

    /// Pending URLs not yet visited; what a resumed run would start from
    pub outstanding: u64,

    /// Stored documents
    pub documents: u64,

    /// Distinct vocabulary words
    pub words: u64,
}

/// Loads statistics from storage
pub fn load_statistics(store: &SqliteStore) -> StorageResult<CrawlStatistics> {
    Ok(CrawlStatistics {
        visited: store.count_visited()?,
        pending: store.count_pending()?,
        outstanding: store.count_outstanding()?,
        documents: store.count_documents()?,
        words: store.count_words()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Crawl state:");
    println!("  Visited URLs: {}", stats.visited);
    println!("  Pending URLs: {}", stats.pending);
    println!("  Outstanding:  {}", stats.outstanding);
    println!();

    println!("Index:");
    println!("  Documents: {}", stats.documents);
    println!("  Vocabulary: {}", stats.words);

    if stats.visited > 0 {
        let coverage = (stats.documents as f64 / stats.visited as f64) * 100.0;
        println!();
        println!(
            "Document Coverage: {:.1}% ({} / {} visited URLs stored)",
            coverage, stats.documents, stats.visited
        );
    }
}
