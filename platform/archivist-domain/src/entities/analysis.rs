use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entities::{ErrorSummary, ExportMetadata};
use crate::value_objects::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMethod {
    Llm,
    Heuristic,
    Hybrid,
    None,
}

impl std::fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScoringMethod::Llm => "llm",
            ScoringMethod::Heuristic => "heuristic",
            ScoringMethod::Hybrid => "hybrid",
            ScoringMethod::None => "none",
        };
        f.write_str(s)
    }
}

/// A Record with optional analyzer contributions layered on top. The
/// `#[serde(flatten)]` guarantees every original field round-trips
/// bit-identically (Property 8): nothing here touches `record` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "usefulnessScore")]
    pub usefulness_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "customAnalysis")]
    pub custom_analysis: Option<Map<String, Value>>,
}

impl EnrichedRecord {
    pub fn from_record(record: Record) -> Self {
        Self {
            record,
            categories: None,
            usefulness_score: None,
            custom_analysis: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    #[serde(flatten)]
    pub export: ExportMetadata,
    pub analysis_timestamp: DateTime<Utc>,
    pub categories_applied: BTreeSet<String>,
    pub scoring_method: ScoringMethod,
    pub analyzers_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<ErrorSummary>,
}

/// `{ metadata, bookmarks }`. Invariant: a bijection between export
/// `bookmarks` and analysis `bookmarks` by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisArtifact {
    pub metadata: AnalysisMetadata,
    pub bookmarks: Vec<EnrichedRecord>,
}

impl AnalysisArtifact {
    pub fn is_bijection_with(&self, export_ids: &[String]) -> bool {
        if self.bookmarks.len() != export_ids.len() {
            return false;
        }
        let analysis_ids: std::collections::HashSet<&str> =
            self.bookmarks.iter().map(|b| b.id()).collect();
        export_ids.iter().all(|id| analysis_ids.contains(id.as_str()))
    }
}
