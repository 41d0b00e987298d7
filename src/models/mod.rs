// src/models/mod.rs

//! Domain models for the crawler application.

mod config;
mod resource;

// Re-export all public types
pub use config::{Config, CrawlerConfig, SelectorConfig};
pub use resource::{ResourceRecord, Snapshot};
