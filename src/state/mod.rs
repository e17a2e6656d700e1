//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitedSet`: URLs already scheduled or fetched, used to deduplicate the frontier
//! - `CrawlPhase`: lifecycle of the orchestrator (`Initializing -> Running -> Stopped`)
//! - `StopReason`: why a run reached `Stopped`

mod phase;
mod visited;

pub use phase::{CrawlPhase, StopReason};
pub use visited::VisitedSet;
