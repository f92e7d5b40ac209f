use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::entities::ExportArtifact;
use crate::errors::AnalyzerError;
use crate::value_objects::Record;

/// Per-record analyzer contribution. Absent fields mean "this analyzer
/// did not contribute this field"; `failure` is set when the analyzer
/// fell back due to a normal (non-programmer) error, so the engine can
/// still record an incident even though the fallback values are present.
#[derive(Debug, Clone, Default)]
pub struct RecordAnalysisResult {
    pub categories: Option<Vec<String>>,
    pub usefulness_score: Option<u8>,
    pub custom_fields: Option<Map<String, Value>>,
    pub failure: Option<String>,
}

impl RecordAnalysisResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { failure: Some(message.into()), ..Self::default() }
    }
}

/// A record-scoped analyzer (`LMCategorizer`, `UsefulnessScorer`): called
/// once per record. Must not raise on normal failure (§4.5 contract);
/// raising is reserved for programmer/configuration errors.
#[async_trait]
pub trait RecordAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    /// One-time setup (e.g. verify capability reachability). Failure
    /// disables this analyzer for the job; it does not abort the job.
    async fn initialize(&self) -> Result<(), AnalyzerError> {
        Ok(())
    }

    async fn analyze(&self, record: &Record) -> RecordAnalysisResult;
}

/// A job-scoped analyzer (`ScriptRunner`): called once with the whole
/// artifact. A failure here discards the entire contribution (Property 11).
#[derive(Debug, Clone, Default)]
pub struct JobAnalysisResult {
    /// Keyed by record `id`; each value becomes that record's
    /// `customAnalysis[name()]`.
    pub per_record_fields: HashMap<String, Map<String, Value>>,
}

#[async_trait]
pub trait JobAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    async fn initialize(&self) -> Result<(), AnalyzerError> {
        Ok(())
    }

    async fn analyze(&self, artifact: &ExportArtifact) -> Result<JobAnalysisResult, AnalyzerError>;
}

/// The tagged-variant registry entry the Analysis Engine schedules over
/// (§9 design note: "the analyzer hierarchy ... becomes a tagged variant
/// ... with the three analyzers as variants").
pub enum AnalyzerHandle {
    Record(Box<dyn RecordAnalyzer>),
    Job(Box<dyn JobAnalyzer>),
}

impl AnalyzerHandle {
    pub fn name(&self) -> &str {
        match self {
            AnalyzerHandle::Record(a) => a.name(),
            AnalyzerHandle::Job(a) => a.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysUncategorized;

    #[async_trait]
    impl RecordAnalyzer for AlwaysUncategorized {
        fn name(&self) -> &str {
            "always-uncategorized"
        }

        async fn analyze(&self, _record: &Record) -> RecordAnalysisResult {
            RecordAnalysisResult {
                categories: Some(vec!["uncategorized".to_string()]),
                ..RecordAnalysisResult::default()
            }
        }
    }

    #[tokio::test]
    async fn record_analyzer_can_be_boxed_and_invoked() {
        let analyzer: Box<dyn RecordAnalyzer> = Box::new(AlwaysUncategorized);
        let record = Record {
            id: "1".to_string(),
            url: None,
            text: None,
            author_username: None,
            author_name: None,
            created_at: "2024-01-15T10:00:00Z".to_string(),
            like_count: None,
            retweet_count: None,
            reply_count: None,
        };
        let result = analyzer.analyze(&record).await;
        assert_eq!(result.categories, Some(vec!["uncategorized".to_string()]));
    }
}
