// src/pipeline/mod.rs

//! Pipeline entry points for crawler operations.
//!
//! - `CrawlEngine`: discover and fetch the full catalog snapshot
//! - `diff`: compare a current snapshot against a past one

pub mod control;
pub mod crawl;
pub mod diff;
pub mod progress;

pub use control::{Checkpoint, ControlReceiver, CrawlCommand, CrawlControl, CrawlState};
pub use crawl::{CrawlEngine, CrawlOutcome};
pub use diff::{diff, DiffResult, DiffStats};
pub use progress::{LogLevel, LogSink, NullSink, ProgressSink};
