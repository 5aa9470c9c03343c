//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitedSet`: canonical URLs claimed within one crawl invocation
//! - `TaskOutcome` / `SkipReason`: how each crawl task ended

mod outcome;
mod visited;

// Re-export main types
pub use outcome::{SkipReason, TaskOutcome};
pub use visited::VisitedSet;
