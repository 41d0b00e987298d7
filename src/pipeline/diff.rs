// src/pipeline/diff.rs

//! Snapshot diff calculation.
//!
//! Compares the current crawl snapshot against the previously captured
//! one and keeps only the resources worth reporting: records whose
//! identity is new, or whose version or updated date changed. Removed
//! resources are counted in the stats but never emitted as records.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::ResourceRecord;

/// Aggregate statistics for one snapshot comparison.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Records in the current snapshot
    pub total_current: usize,
    /// Records in the past snapshot
    pub total_past: usize,
    /// Records emitted in the diff (new + modified)
    pub total_changed: usize,
    /// Identities present now but not before
    pub new_count: usize,
    /// Existing identities whose version or updated date changed
    pub modified_count: usize,
    /// Identities present before but not now
    pub removed_count: usize,
    /// Sorted new identities
    pub new_identities: Vec<u64>,
    /// Sorted removed identities
    pub removed_identities: Vec<u64>,
}

/// Result of comparing a current snapshot against a past one.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiffResult {
    /// New or modified records drawn from the current snapshot, in
    /// current-snapshot order
    pub records: Vec<ResourceRecord>,
    /// Aggregate statistics
    pub stats: DiffStats,
}

impl DiffResult {
    /// Check if there are any changes, including removals.
    pub fn has_changes(&self) -> bool {
        !self.records.is_empty() || self.stats.removed_count > 0
    }
}

/// Compare two snapshots by identity.
///
/// A record is new when no past record shares its identity, and
/// modified when its version or updated date differs by plain string
/// comparison (absent fields compare as empty). Pure and idempotent:
/// `diff(s, s)` emits no records. Duplicate identities on the past
/// side collapse to the last occurrence, sentinel collisions included.
pub fn diff(current: &[ResourceRecord], past: &[ResourceRecord]) -> DiffResult {
    let past_by_identity: HashMap<u64, &ResourceRecord> =
        past.iter().map(|r| (r.identity, r)).collect();

    let mut records = Vec::new();
    for record in current {
        match past_by_identity.get(&record.identity) {
            None => records.push(record.clone()),
            Some(previous) => {
                if record.version_or_empty() != previous.version_or_empty()
                    || record.updated_date_or_empty() != previous.updated_date_or_empty()
                {
                    records.push(record.clone());
                }
            }
        }
    }

    let current_ids: BTreeSet<u64> = current.iter().map(|r| r.identity).collect();
    let past_ids: BTreeSet<u64> = past.iter().map(|r| r.identity).collect();
    let changed_ids: BTreeSet<u64> = records.iter().map(|r| r.identity).collect();

    let new_identities: Vec<u64> = current_ids.difference(&past_ids).copied().collect();
    let removed_identities: Vec<u64> = past_ids.difference(&current_ids).copied().collect();

    // New records are the changed ones carrying a new identity; the
    // rest of the emitted records are modifications.
    let new_count = new_identities
        .iter()
        .filter(|id| changed_ids.contains(id))
        .count();
    let modified_count = records.len() - new_count;

    let stats = DiffStats {
        total_current: current.len(),
        total_past: past.len(),
        total_changed: records.len(),
        new_count,
        modified_count,
        removed_count: removed_identities.len(),
        new_identities,
        removed_identities,
    };

    DiffResult { records, stats }
}
