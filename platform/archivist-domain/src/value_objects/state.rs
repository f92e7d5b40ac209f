use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Record;

/// The export-resume marker. The only durable mutable state owned by the
/// Export Engine; no other component writes it. Carries every record
/// accumulated so far, not just the cursor, so a resume can complete the
/// full stream instead of only the tail (Property 6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportState {
    pub last_cursor: Option<String>,
    pub processed_count: u64,
    pub start_time: DateTime<Utc>,
    pub api_version: String,
    #[serde(default)]
    pub bookmarks: Vec<Record>,
}

impl ExportState {
    pub fn fresh(api_version: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            last_cursor: None,
            processed_count: 0,
            start_time,
            api_version: api_version.into(),
            bookmarks: Vec::new(),
        }
    }
}

/// Rate-limit state as most recently reported by the remote API. Owned
/// exclusively by the Rate Governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitInfo {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}
