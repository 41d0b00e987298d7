// src/services/mod.rs

//! Leaf services: identity resolution, version normalization, field
//! extraction, and the catalog session collaborator.

pub mod extract;
pub mod identity;
pub mod session;
pub mod version;

pub use extract::FieldExtractor;
pub use session::{CapturedPayload, CatalogSession, FetchedPage, HttpSession};
