//! Global request throttling
//!
//! A token bucket holding at most `requests` permits, refilled in full at
//! every `period` boundary. The bucket starts empty, so `B` acquisitions
//! always span at least `ceil(B / requests)` periods.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Configured requests per second above which a warning is logged
pub const SAFE_RATE_CEILING: f64 = 50.0;

/// Longest refill period a throttler will honor
pub const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// A number of requests allowed per time period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRate {
    pub requests: u32,
    pub period: Duration,
}

impl RequestRate {
    pub fn new(requests: u32, period: Duration) -> Self {
        Self { requests, period }
    }

    /// Normalized rate in requests per second
    pub fn per_second(&self) -> f64 {
        let secs = self.period.as_secs_f64();
        if secs == 0.0 {
            return f64::INFINITY;
        }
        f64::from(self.requests) / secs
    }
}

impl fmt::Display for RequestRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:?}", self.requests, self.period)
    }
}

#[derive(Debug)]
struct Bucket {
    available: u32,
    next_refill: Instant,
}

/// Token-bucket limiter shared by every in-flight fetch
///
/// Waiters queue on a fair mutex, so permits are handed out in arrival order.
#[derive(Debug)]
pub struct Throttler {
    rate: RequestRate,
    bucket: Mutex<Bucket>,
    granted: AtomicU64,
}

impl Throttler {
    /// Creates a throttler
    ///
    /// Zero requests become 1; the period is clamped to `1ms..=`[`MAX_PERIOD`].
    pub fn new(rate: RequestRate) -> Self {
        let rate = RequestRate {
            requests: rate.requests.max(1),
            period: rate.period.clamp(Duration::from_millis(1), MAX_PERIOD),
        };

        Self {
            rate,
            bucket: Mutex::new(Bucket {
                available: 0,
                next_refill: Instant::now() + rate.period,
            }),
            granted: AtomicU64::new(0),
        }
    }

    /// Builds the throttler for a site, honoring the rate its robots.txt suggests
    ///
    /// The slower of the two rates wins. A configured rate above
    /// [`SAFE_RATE_CEILING`] is accepted but logged.
    pub fn for_site(configured: RequestRate, robots_suggested: Option<RequestRate>) -> Self {
        if configured.per_second() > SAFE_RATE_CEILING {
            tracing::warn!(
                "Configured rate of {:.1} requests/second exceeds the safe ceiling of {}; the site may block this crawler",
                configured.per_second(),
                SAFE_RATE_CEILING
            );
        }

        let effective = match robots_suggested {
            Some(suggested) if suggested.per_second() < configured.per_second() => {
                tracing::info!(
                    "Using robots.txt request rate {} instead of configured {}",
                    suggested,
                    configured
                );
                suggested
            }
            _ => configured,
        };

        Self::new(effective)
    }

    /// The rate actually enforced
    pub fn rate(&self) -> RequestRate {
        self.rate
    }

    /// Number of permits handed out so far
    pub fn granted(&self) -> u64 {
        self.granted.load(Ordering::Relaxed)
    }

    /// Waits until a permit is available and consumes it
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;

        loop {
            let now = Instant::now();
            if now >= bucket.next_refill {
                let behind = now.duration_since(bucket.next_refill);
                let skipped = (behind.as_nanos() / self.rate.period.as_nanos()) as u32;
                bucket.next_refill += self.rate.period * (skipped + 1);
                bucket.available = self.rate.requests;
            }

            if bucket.available > 0 {
                bucket.available -= 1;
                break;
            }

            let wake_at = bucket.next_refill;
            tracing::trace!("Throttled, waiting {:?}", wake_at - now);
            // Holding the lock while asleep keeps later callers queued behind us
            tokio::time::sleep_until(wake_at).await;
        }

        self.granted.fetch_add(1, Ordering::Relaxed);
    }
}
