use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress/summary events emitted by the Export Engine (C11). Sent over
/// an unbounded channel to whatever progress sink the caller provides;
/// the processed count is non-decreasing (Property 15).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportEvent {
    PageFetched { cursor: Option<String>, records_in_page: usize, processed_count: u64 },
    RateLimitWait { reset_at: DateTime<Utc> },
    Completed { total_count: usize },
    Aborted { reason: String },
}

/// Progress/summary events emitted by the Analysis Engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    RecordProcessed { processed_count: usize, total_count: usize },
    RecordAnalyzerFailed { record_id: String, analyzer: String, message: String },
    ScriptFailed { script_name: String, message: String },
    Completed { total_count: usize },
    Aborted { reason: String, last_processed_index: usize },
}
