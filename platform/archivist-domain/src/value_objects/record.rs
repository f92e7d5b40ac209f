use serde::{Deserialize, Serialize};

/// A single bookmark as exported from the remote API. Immutable after export.
///
/// Optional fields are modeled as `Option<T>` and never skip serialization:
/// a missing value round-trips as JSON `null`, never as an absent key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub url: Option<String>,
    pub text: Option<String>,
    pub author_username: Option<String>,
    pub author_name: Option<String>,
    pub created_at: String,
    pub like_count: Option<u64>,
    pub retweet_count: Option<u64>,
    pub reply_count: Option<u64>,
}

impl Record {
    /// Total engagement, treating absent counters as zero. Used by the
    /// heuristic scorer and by duplicate-engagement tie-breaking.
    pub fn total_engagement(&self) -> u64 {
        self.like_count.unwrap_or(0) + self.retweet_count.unwrap_or(0) + self.reply_count.unwrap_or(0)
    }
}
