//! Lifecycle phases of a crawl orchestrator
//!
//! A run moves `Initializing -> Running -> Stopped`. There is no way back out
//! of `Stopped`; resuming happens in a new process from persisted state.

use serde::Serialize;
use std::fmt;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StopReason {
    /// `visited_count` reached `max_scraped_count`
    LimitReached,

    /// The frontier ran dry with nothing left pending
    FrontierExhausted,

    /// An external interrupt cancelled the in-flight batch
    Interrupted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LimitReached => "limit_reached",
            Self::FrontierExhausted => "frontier_exhausted",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current phase of a crawl orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Building throttler, robots policy and frontier; loading persisted state
    Initializing,

    /// Executing the batch loop
    Running,

    /// Terminal; no further fetches are issued
    Stopped(StopReason),
}

impl CrawlPhase {
    /// Returns true if no further fetches may be issued
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Initializing, Self::Running)
                | (Self::Initializing, Self::Stopped(_))
                | (Self::Running, Self::Stopped(_))
        )
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => f.write_str("initializing"),
            Self::Running => f.write_str("running"),
            Self::Stopped(reason) => write!(f, "stopped ({})", reason),
        }
    }
}
