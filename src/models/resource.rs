//! Resource record data structure.

use serde::{Deserialize, Serialize};

/// One complete ordered set of records from a single crawl pass
/// or a stored prior state. Order is discovery order.
pub type Snapshot = Vec<ResourceRecord>;

/// A single catalog resource, as captured by one crawl pass.
///
/// Every attribute except `url` and `identity` is best-effort: a field
/// is `None` when no extraction strategy resolved it. Records are
/// constructed once per crawled item and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Canonical resource URL (never empty; primary provenance)
    pub url: String,

    /// Identity derived from the URL; collision-prone sentinel for
    /// URLs without a recognizable resource ID
    pub identity: u64,

    /// Resource title
    pub title: Option<String>,

    /// Numeric developer/author identifier
    pub developer_id: Option<String>,

    /// Normalized version string (dotted form where recognizable)
    pub version: Option<String>,

    /// Last-updated date, as published by the catalog
    pub updated_date: Option<String>,

    /// Short one-line description
    pub tagline: Option<String>,

    /// Contributor display name
    pub contributor: Option<String>,
}

impl ResourceRecord {
    /// The version field with absence flattened to an empty string,
    /// as used by modification checks.
    pub fn version_or_empty(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }

    /// The updated-date field with absence flattened to an empty string.
    pub fn updated_date_or_empty(&self) -> &str {
        self.updated_date.as_deref().unwrap_or("")
    }

    /// A human-readable label for progress reporting.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ResourceRecord {
        ResourceRecord {
            url: "https://example.com/exchange/1234/overview".to_string(),
            identity: 1234,
            title: Some("Tag Browser".to_string()),
            developer_id: Some("42".to_string()),
            version: Some("1.3.0".to_string()),
            updated_date: Some("2026-01-15".to_string()),
            tagline: None,
            contributor: Some("Acme".to_string()),
        }
    }

    #[test]
    fn test_label_prefers_title() {
        let record = sample_record();
        assert_eq!(record.label(), "Tag Browser");
    }

    #[test]
    fn test_label_falls_back_to_url() {
        let mut record = sample_record();
        record.title = None;
        assert_eq!(record.label(), "https://example.com/exchange/1234/overview");
    }

    #[test]
    fn test_missing_fields_flatten_to_empty() {
        let mut record = sample_record();
        record.version = None;
        record.updated_date = None;
        assert_eq!(record.version_or_empty(), "");
        assert_eq!(record.updated_date_or_empty(), "");
    }

    #[test]
    fn test_serde_round_trip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: ResourceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
