//! Retry policy for rate-limited responses
//!
//! The policy is a plain value composed around any single-attempt request
//! function, so it can be exercised without a network.

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;

/// One HTTP response as seen by the fetcher, before any policy is applied
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// URL the request was sent to
    pub url: String,
    pub status: StatusCode,
    /// `Location` header, for redirects
    pub location: Option<String>,
    /// Body text; only read for 2xx responses
    pub body: Option<String>,
}

/// Outcome of running a request under a [`RetryPolicy`]
#[derive(Debug)]
pub enum RetryOutcome<E> {
    /// A response with a non-retryable status (which may still be an error status)
    Response {
        response: RawResponse,
        /// Number of backoff sleeps taken before this response
        backoffs: u32,
    },

    /// Every attempt returned a retryable status
    Exhausted { status: StatusCode, attempts: u32 },

    /// The request failed below HTTP; not retried
    Transport(E),
}

/// Fixed-interval retry on retryable statuses
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    pub backoff: Duration,
    pub retryable: fn(StatusCode) -> bool,
}

/// 429 Too Many Requests and 503 Service Unavailable
pub fn is_rate_limited(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff: Duration::from_secs(1),
            retryable: is_rate_limited,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
            ..Self::default()
        }
    }

    /// Calls `attempt` until it yields a non-retryable response, a transport
    /// error, or the retry budget runs out
    pub async fn run<F, Fut, E>(&self, mut attempt: F) -> RetryOutcome<E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<RawResponse, E>>,
    {
        let mut backoffs = 0;

        loop {
            let response = match attempt().await {
                Ok(response) => response,
                Err(e) => return RetryOutcome::Transport(e),
            };

            if !(self.retryable)(response.status) {
                return RetryOutcome::Response { response, backoffs };
            }

            if backoffs >= self.max_retries {
                tracing::error!(
                    "Giving up on {} after {} attempts (last status {})",
                    response.url,
                    backoffs + 1,
                    response.status.as_u16()
                );
                return RetryOutcome::Exhausted {
                    status: response.status,
                    attempts: backoffs + 1,
                };
            }

            backoffs += 1;
            tracing::warn!(
                "{} returned {}, retrying in {:?} (retry {}/{})",
                response.url,
                response.status.as_u16(),
                self.backoff,
                backoffs,
                self.max_retries
            );
            tokio::time::sleep(self.backoff).await;
        }
    }
}
