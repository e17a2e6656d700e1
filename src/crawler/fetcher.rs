//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Throttling every individual request through the shared [`Throttler`]
//! - Retrying rate-limited responses via [`RetryPolicy`]
//! - Following exactly one redirect hop, within the [`RedirectScope`]
//! - Error classification
//!
//! `fetch` never returns an error; every failure is folded into a [`FetchResult`].

use crate::config::Config;
use crate::crawler::retry::{RawResponse, RetryOutcome, RetryPolicy};
use crate::crawler::throttle::Throttler;
use crate::robots::RobotsPolicy;
use crate::url::LinkFilter;
use reqwest::{header::LOCATION, redirect::Policy, Client};
use std::sync::Arc;
use url::Url;

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// URL that was requested
        url: String,
        /// URL the body came from (differs after a redirect)
        final_url: String,
        status_code: u16,
        body: String,
    },

    /// Terminal non-2xx response, including an unfollowed redirect
    HttpError { url: String, status_code: u16 },

    /// Every attempt was rate limited
    RetriesExhausted {
        url: String,
        status_code: u16,
        attempts: u32,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError { url: String, error: String },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The URL that was requested
    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. }
            | Self::HttpError { url, .. }
            | Self::RetriesExhausted { url, .. }
            | Self::NetworkError { url, .. } => url,
        }
    }

    /// Final HTTP status, if a response was received at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. }
            | Self::HttpError { status_code, .. }
            | Self::RetriesExhausted { status_code, .. } => Some(*status_code),
            Self::NetworkError { .. } => None,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Automatic redirects are disabled; [`Fetcher`] follows a single hop itself.
///
/// # Example
///
/// ```no_run
/// use wiki_trawl::config::Config;
/// use wiki_trawl::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(config.crawler.request_timeout())
        .connect_timeout(config.crawler.connect_timeout())
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Redirect targets a [`Fetcher`] may follow
///
/// A target must be a content link of the crawled site and allowed by its
/// robots.txt, the same rules every discovered link passes.
#[derive(Debug, Clone)]
pub struct RedirectScope {
    filter: LinkFilter,
    robots: RobotsPolicy,
}

impl RedirectScope {
    pub fn new(filter: LinkFilter, robots: RobotsPolicy) -> Self {
        Self { filter, robots }
    }

    pub fn permits(&self, target: &Url) -> bool {
        self.filter.is_content_link(target) && self.robots.is_allowed(target.as_str())
    }
}

/// Throttled, retrying page fetcher
pub struct Fetcher {
    client: Client,
    throttler: Arc<Throttler>,
    retry: RetryPolicy,
    scope: Option<RedirectScope>,
}

impl Fetcher {
    /// Creates a fetcher that follows any redirect target
    pub fn new(client: Client, throttler: Arc<Throttler>, retry: RetryPolicy) -> Self {
        Self {
            client,
            throttler,
            retry,
            scope: None,
        }
    }

    /// Restricts redirect-following to targets inside `scope`
    pub fn with_redirect_scope(mut self, scope: RedirectScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn throttler(&self) -> &Arc<Throttler> {
        &self.throttler
    }

    /// Fetches a URL with throttling, retry and single-hop redirect handling
    ///
    /// # Request Flow
    ///
    /// | Response | Action |
    /// |----------|--------|
    /// | 2xx | Success with body |
    /// | 429 / 503 | Sleep the backoff interval and retry, up to `max_retries` times |
    /// | 3xx with `Location` in scope | Re-issue GET once against the target; that response is final |
    /// | 3xx otherwise | HttpError with the 3xx status |
    /// | anything else | HttpError |
    /// | transport failure | NetworkError, not retried |
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let response = match self.request(url, url).await {
            Ok(response) => response,
            Err(result) => return result,
        };

        let response = if response.status.is_redirection() {
            match redirect_target(&response) {
                Some(target) if !self.may_follow(&target) => {
                    tracing::warn!(
                        "Not following redirect {} -> {}: outside crawl scope or disallowed",
                        url,
                        target
                    );
                    response
                }
                Some(target) => {
                    tracing::info!(
                        "Following redirect {} -> {} ({})",
                        url,
                        target,
                        response.status.as_u16()
                    );
                    match self.request(url, &target).await {
                        Ok(response) => response,
                        Err(result) => return result,
                    }
                }
                None => response,
            }
        } else {
            response
        };

        finish(url, response)
    }

    fn may_follow(&self, target: &str) -> bool {
        let Some(scope) = &self.scope else {
            return true;
        };
        Url::parse(target)
            .map(|target| scope.permits(&target))
            .unwrap_or(false)
    }

    /// Runs one logical request (with retries) against `target`
    async fn request(&self, url: &str, target: &str) -> Result<RawResponse, FetchResult> {
        match self.retry.run(|| self.send_once(target)).await {
            RetryOutcome::Response { response, .. } => Ok(response),
            RetryOutcome::Exhausted { status, attempts } => Err(FetchResult::RetriesExhausted {
                url: url.to_string(),
                status_code: status.as_u16(),
                attempts,
            }),
            RetryOutcome::Transport(e) => {
                let error = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    "Connection refused".to_string()
                } else {
                    e.to_string()
                };
                tracing::warn!("Network error fetching {}: {}", target, error);
                Err(FetchResult::NetworkError {
                    url: url.to_string(),
                    error,
                })
            }
        }
    }

    /// A single throttled GET
    async fn send_once(&self, target: &str) -> Result<RawResponse, reqwest::Error> {
        self.throttler.acquire().await;

        let response = self.client.get(target).send().await?;
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::debug!("GET {} -> {}", target, status.as_u16());

        let body = if status.is_success() {
            Some(response.text().await?)
        } else {
            None
        };

        Ok(RawResponse {
            url: target.to_string(),
            status,
            location,
            body,
        })
    }
}

/// Resolves a redirect's `Location` against the URL that produced it
fn redirect_target(response: &RawResponse) -> Option<String> {
    let location = response.location.as_deref()?;
    let base = Url::parse(&response.url).ok()?;
    base.join(location).ok().map(String::from)
}

fn finish(url: &str, response: RawResponse) -> FetchResult {
    let status_code = response.status.as_u16();

    match response.body {
        Some(body) if response.status.is_success() => {
            tracing::info!("Fetched {} ({})", response.url, status_code);
            FetchResult::Success {
                url: url.to_string(),
                final_url: response.url,
                status_code,
                body,
            }
        }
        _ => {
            tracing::warn!("Failed to fetch {} ({})", url, status_code);
            FetchResult::HttpError {
                url: url.to_string(),
                status_code,
            }
        }
    }
}
