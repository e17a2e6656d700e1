//! Bounded FIFO work queue of pending URLs
//!
//! The queue performs no I/O and no deduplication; the orchestrator filters
//! links against the visited set before they get here. Once full, further
//! enqueues are dropped and counted.

use std::collections::VecDeque;

/// Default capacity bound
pub const DEFAULT_CAPACITY: usize = 1_000_000;

/// Pending-URL queue driving the crawl
#[derive(Debug, Clone)]
pub struct Frontier {
    queue: VecDeque<String>,
    capacity: usize,
    dropped: u64,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Frontier {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Enqueues the initial URLs; same capacity rules as [`extend`](Self::extend)
    pub fn seed<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend(urls)
    }

    /// Appends URLs in order until the queue is full
    ///
    /// Returns how many were retained; the rest are counted in [`dropped`](Self::dropped).
    pub fn extend<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut retained = 0;
        let mut dropped = 0;

        for url in urls {
            if self.queue.len() >= self.capacity {
                dropped += 1;
                continue;
            }
            self.queue.push_back(url.into());
            retained += 1;
        }

        if dropped > 0 {
            self.dropped += dropped;
            tracing::debug!(
                "Frontier full ({} entries), dropped {} URLs",
                self.capacity,
                dropped
            );
        }

        retained
    }

    /// Removes and returns up to `n` URLs from the front
    pub fn draw_batch(&mut self, n: usize) -> Vec<String> {
        let n = n.min(self.queue.len());
        self.queue.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total enqueues rejected because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
