// src/pipeline/progress.rs

//! Progress and log event sink.
//!
//! The engine reports two event kinds while it runs: log lines and
//! per-item progress. How (or whether) the host stores them is not the
//! engine's concern.

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// Consumer of crawl log and progress events.
pub trait ProgressSink: Send + Sync {
    /// A log line produced while crawling.
    fn log(&self, message: &str, level: LogLevel);

    /// Progress update: `current` of `total` items done, with a label
    /// for the item just processed.
    fn progress(&self, current: usize, total: usize, current_item: &str);
}

/// Default sink that forwards everything to the `log` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn log(&self, message: &str, level: LogLevel) {
        match level {
            LogLevel::Info => log::info!("{message}"),
            LogLevel::Warning => log::warn!("{message}"),
            LogLevel::Error => log::error!("{message}"),
        }
    }

    fn progress(&self, current: usize, total: usize, current_item: &str) {
        log::info!("[{current}/{total}] {current_item}");
    }
}

/// Sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn log(&self, _message: &str, _level: LogLevel) {}
    fn progress(&self, _current: usize, _total: usize, _current_item: &str) {}
}
