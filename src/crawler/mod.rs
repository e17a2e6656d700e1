//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The bounded frontier queue
//! - Global rate limiting
//! - HTTP fetching with retry and redirect handling
//! - HTML parsing and link extraction
//! - The batch orchestration loop

mod fetcher;
mod frontier;
mod orchestrator;
mod parser;
mod retry;
mod throttle;

pub use fetcher::{build_http_client, FetchResult, Fetcher, RedirectScope};
pub use frontier::{Frontier, DEFAULT_CAPACITY};
pub use orchestrator::CrawlOrchestrator;
pub use parser::{parse_html, ParsedPage};
pub use retry::{is_rate_limited, RawResponse, RetryOutcome, RetryPolicy};
pub use throttle::{RequestRate, Throttler, MAX_PERIOD, SAFE_RATE_CEILING};
