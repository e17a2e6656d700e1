use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Wiki-Trawl
///
/// Every table and key is optional; missing values fall back to the defaults
/// below, which crawl twenty English Wikipedia articles at twenty requests per
/// second.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// First URL fetched on a cold start
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Scheme and host every crawled URL must share; robots.txt is read from here
    #[serde(rename = "site-base")]
    pub site_base: String,

    /// Path prefix identifying article pages (e.g. "/wiki/")
    #[serde(rename = "content-prefix")]
    pub content_prefix: String,

    /// Permits handed out per `time-period-ms`
    #[serde(rename = "requests-per-second")]
    pub requests_per_second: u32,

    /// Length of one throttling period (milliseconds)
    #[serde(rename = "time-period-ms")]
    pub time_period_ms: u64,

    /// Maximum number of URLs fetched concurrently in one batch
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Stop once this many documents have been fetched in the current run
    #[serde(rename = "max-scraped-count")]
    pub max_scraped_count: u64,

    /// Upper bound on pending URLs held in memory
    #[serde(rename = "frontier-capacity")]
    pub frontier_capacity: usize,

    /// Additional attempts after a 429/503 response
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Fixed sleep between rate-limited attempts (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// TCP connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: "https://en.wikipedia.org/wiki/Main_Page".to_string(),
            site_base: "https://en.wikipedia.org".to_string(),
            content_prefix: "/wiki/".to_string(),
            requests_per_second: 20,
            time_period_ms: 1000,
            batch_size: 5,
            max_scraped_count: 20,
            frontier_capacity: 1_000_000,
            max_retries: 5,
            retry_backoff_ms: 1000,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl CrawlerConfig {
    pub fn time_period(&self) -> Duration {
        Duration::from_millis(self.time_period_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "WikiTrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.org/wiki-trawl".to_string(),
            contact_email: "crawler@example.org".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the full User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database holding crawl state and documents
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "out/wiki-trawl.db".to_string(),
        }
    }
}
