// src/storage/mod.rs

//! Local snapshot persistence.
//!
//! The engine itself has no persistence opinions; it consumes and
//! produces plain record sequences. This module gives hosts a small
//! JSON envelope for keeping snapshots between runs.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Snapshot;

/// On-disk snapshot envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// When the snapshot was captured
    pub scraped_at: DateTime<Utc>,
    /// Record count, for quick inspection without parsing the body
    pub count: usize,
    /// The records, in discovery order
    pub resources: Snapshot,
}

impl SnapshotFile {
    /// Wrap a freshly crawled snapshot with the current timestamp.
    pub fn new(resources: Snapshot) -> Self {
        Self {
            scraped_at: Utc::now(),
            count: resources.len(),
            resources,
        }
    }
}

/// Write a snapshot envelope as pretty-printed JSON.
pub async fn save_snapshot(path: impl AsRef<Path>, snapshot: &SnapshotFile) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Load a snapshot envelope from disk.
pub async fn load_snapshot(path: impl AsRef<Path>) -> Result<SnapshotFile> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a snapshot if the file exists; `Ok(None)` when it does not.
pub async fn load_snapshot_optional(path: impl AsRef<Path>) -> Result<Option<SnapshotFile>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceRecord;

    fn make_record(id: u64) -> ResourceRecord {
        ResourceRecord {
            url: format!("https://host/exchange/{id}/overview"),
            identity: id,
            title: Some(format!("Resource {id}")),
            developer_id: None,
            version: Some("1.0.0".to_string()),
            updated_date: None,
            tagline: None,
            contributor: None,
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let snapshot = SnapshotFile::new(vec![make_record(1), make_record(2)]);
        save_snapshot(&path, &snapshot).await.unwrap();

        let loaded = load_snapshot(&path).await.unwrap();
        assert_eq!(loaded.count, 2);
        assert_eq!(loaded.resources, snapshot.resources);
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let loaded = load_snapshot_optional(&path).await.unwrap();
        assert!(loaded.is_none());
        assert!(load_snapshot(&path).await.is_err());
    }
}
