//! End-of-run crawl report

use crate::state::StopReason;
use serde::Serialize;
use std::time::Duration;

/// Counters accumulated by one orchestrator run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    /// Batches whose fetches completed
    pub batches: u64,

    /// URLs fetched (or attempted) in this run
    pub visited_count: u64,

    pub succeeded: u64,
    pub failed: u64,

    /// Links extracted from successful pages
    pub links_found: u64,

    /// Links that passed the filter
    pub links_enqueued: u64,

    /// Links rejected by the filter
    pub links_discarded: u64,

    /// Enqueues dropped because the frontier was full
    pub frontier_dropped: u64,

    pub documents_saved: u64,

    pub stop_reason: Option<StopReason>,

    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

/// Prints a crawl report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    let stop = report
        .stop_reason
        .map(|r| r.to_string())
        .unwrap_or_else(|| "not started".to_string());
    println!("Stopped: {}", stop);
    println!("Elapsed: {:.1}s", report.elapsed.as_secs_f64());
    println!();

    println!("Fetching:");
    println!("  Batches: {}", report.batches);
    println!("  Visited: {}", report.visited_count);
    println!("  Succeeded: {}", report.succeeded);
    println!("  Failed: {}", report.failed);
    println!();

    println!("Links:");
    println!("  Found: {}", report.links_found);
    println!("  Enqueued: {}", report.links_enqueued);
    println!("  Discarded: {}", report.links_discarded);
    if report.frontier_dropped > 0 {
        println!("  Dropped (frontier full): {}", report.frontier_dropped);
    }
    println!();

    println!("Documents saved: {}", report.documents_saved);
}
