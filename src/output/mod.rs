//! Output module for crawl reports and database statistics
//!
//! This module handles:
//! - The per-run [`CrawlReport`] returned by the orchestrator
//! - Statistics read back from the crawl database for `--stats`

mod report;
pub mod stats;

pub use report::{print_report, CrawlReport};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
