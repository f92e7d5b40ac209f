use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub export_timestamp: DateTime<Utc>,
    pub total_count: usize,
    pub exporter_version: String,
    pub user_id: String,
    pub username: String,
}

/// `{ metadata, bookmarks }`. Invariant: `metadata.total_count ==
/// bookmarks.len()`; invariant: `id` values are unique within `bookmarks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub metadata: ExportMetadata,
    pub bookmarks: Vec<Record>,
}

impl ExportArtifact {
    pub fn new(metadata: ExportMetadata, bookmarks: Vec<Record>) -> Self {
        Self { metadata, bookmarks }
    }

    pub fn has_unique_ids(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.bookmarks.len());
        self.bookmarks.iter().all(|r| seen.insert(r.id.as_str()))
    }

    pub fn counts_are_consistent(&self) -> bool {
        self.metadata.total_count == self.bookmarks.len()
    }
}
