use std::path::PathBuf;
use std::sync::Arc;

use archivist_application::analysis::AnalysisEngine;
use archivist_application::config::AnalysisConfig;
use archivist_application::validation::SchemaValidator;
use archivist_domain::entities::{AnalysisArtifact, ExportArtifact, ExportMetadata};
use archivist_domain::errors::AnalyzerError;
use archivist_domain::events::AnalysisEvent;
use archivist_domain::repositories::{ArtifactReader, ArtifactWriter};
use archivist_domain::services::analyzers::{
    AnalyzerHandle, JobAnalysisResult, JobAnalyzer, RecordAnalysisResult, RecordAnalyzer,
};
use archivist_domain::value_objects::Record;
use async_trait::async_trait;

struct FixedExportReader(ExportArtifact);

#[async_trait]
impl ArtifactReader for FixedExportReader {
    async fn read_export(&self, _path: &std::path::Path) -> Result<ExportArtifact, String> {
        Ok(self.0.clone())
    }
}

struct CapturingWriter {
    dir: PathBuf,
}

#[async_trait]
impl ArtifactWriter for CapturingWriter {
    async fn write_export(&self, _artifact: &ExportArtifact, _basename: &str) -> Result<PathBuf, String> {
        unimplemented!()
    }

    async fn write_analysis(
        &self,
        artifact: &AnalysisArtifact,
        basename: &str,
        partial: bool,
    ) -> Result<PathBuf, String> {
        let suffix = if partial { "_partial" } else { "" };
        let path = self.dir.join(format!("{basename}{suffix}.json"));
        std::fs::write(&path, serde_json::to_string_pretty(artifact).unwrap()).map_err(|e| e.to_string())?;
        Ok(path)
    }
}

fn record(id: &str, text: &str) -> Record {
    Record {
        id: id.to_string(),
        url: None,
        text: Some(text.to_string()),
        author_username: None,
        author_name: None,
        created_at: "2024-01-15T10:00:00Z".to_string(),
        like_count: Some(3),
        retweet_count: Some(1),
        reply_count: Some(0),
    }
}

fn export_artifact(records: Vec<Record>) -> ExportArtifact {
    ExportArtifact::new(
        ExportMetadata {
            export_timestamp: chrono::Utc::now(),
            total_count: records.len(),
            exporter_version: "0.1.0".to_string(),
            user_id: "u1".to_string(),
            username: "user".to_string(),
        },
        records,
    )
}

/// Fails categorization for record ids in `fail_ids`, otherwise returns a
/// fixed category — mirrors S5 (LM failure fallback).
struct FlakyCategorizer {
    fail_ids: Vec<String>,
}

#[async_trait]
impl RecordAnalyzer for FlakyCategorizer {
    fn name(&self) -> &str {
        "lm-categorizer"
    }

    async fn analyze(&self, record: &Record) -> RecordAnalysisResult {
        if self.fail_ids.contains(&record.id) {
            RecordAnalysisResult {
                categories: Some(vec!["uncategorized".to_string()]),
                failure: Some("lm timeout".to_string()),
                ..Default::default()
            }
        } else {
            RecordAnalysisResult { categories: Some(vec!["tech".to_string()]), ..Default::default() }
        }
    }
}

struct FixedScorer;

#[async_trait]
impl RecordAnalyzer for FixedScorer {
    fn name(&self) -> &str {
        "usefulness-scorer"
    }

    async fn analyze(&self, _record: &Record) -> RecordAnalysisResult {
        RecordAnalysisResult { usefulness_score: Some(75), ..Default::default() }
    }
}

struct AlwaysFailingScript;

#[async_trait]
impl JobAnalyzer for AlwaysFailingScript {
    fn name(&self) -> &str {
        "sentiment-script"
    }

    async fn analyze(&self, _artifact: &ExportArtifact) -> Result<JobAnalysisResult, AnalyzerError> {
        Err(AnalyzerError { analyzer: "sentiment-script".to_string(), message: "exit code 1".to_string() })
    }
}

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("archivist-analysis-test-{label}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn s5_lm_failure_falls_back_to_uncategorized() {
    let dir = temp_dir("s5");
    let records = vec![record("1", "a"), record("2", "b"), record("3", "c")];
    let export = export_artifact(records);
    let reader = Arc::new(FixedExportReader(export));
    let writer = Arc::new(CapturingWriter { dir: dir.clone() });
    let validator = Arc::new(SchemaValidator::new().unwrap());
    let engine = AnalysisEngine::new(
        reader,
        writer,
        validator,
        AnalysisConfig {
            output_dir: dir.display().to_string(),
            concurrency: 4,
            categorizer: Default::default(),
            scorer: Default::default(),
            scripts: vec![],
        },
    );
    let analyzers = vec![AnalyzerHandle::Record(Box::new(FlakyCategorizer { fail_ids: vec!["2".to_string()] }))];
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<AnalysisEvent>();
    let cancel = archivist_application::cancel::CancelToken::new();
    let path = engine.run(std::path::Path::new("unused"), analyzers, tx, cancel).await.unwrap();

    let artifact: AnalysisArtifact = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let failed = artifact.bookmarks.iter().find(|b| b.id() == "2").unwrap();
    assert_eq!(failed.categories, Some(vec!["uncategorized".to_string()]));
    let ok = artifact.bookmarks.iter().find(|b| b.id() == "1").unwrap();
    assert_eq!(ok.categories, Some(vec!["tech".to_string()]));
    let summary = artifact.metadata.error_summary.unwrap();
    assert_eq!(summary.incidents.len(), 1);
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn property_12_error_containment_keeps_all_records() {
    let dir = temp_dir("containment");
    let records = vec![record("1", "a"), record("2", "b")];
    let export = export_artifact(records);
    let reader = Arc::new(FixedExportReader(export));
    let writer = Arc::new(CapturingWriter { dir: dir.clone() });
    let validator = Arc::new(SchemaValidator::new().unwrap());
    let engine = AnalysisEngine::new(
        reader,
        writer,
        validator,
        AnalysisConfig {
            output_dir: dir.display().to_string(),
            concurrency: 2,
            categorizer: Default::default(),
            scorer: Default::default(),
            scripts: vec![],
        },
    );
    let analyzers: Vec<AnalyzerHandle> = vec![
        AnalyzerHandle::Record(Box::new(FlakyCategorizer { fail_ids: vec!["1".to_string(), "2".to_string()] })),
        AnalyzerHandle::Record(Box::new(FixedScorer)),
    ];
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<AnalysisEvent>();
    let cancel = archivist_application::cancel::CancelToken::new();
    let path = engine.run(std::path::Path::new("unused"), analyzers, tx, cancel).await.unwrap();
    let artifact: AnalysisArtifact = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(artifact.bookmarks.len(), 2);
    assert_eq!(artifact.metadata.error_summary.unwrap().incidents.len(), 2);
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn property_11_script_isolation_discards_failed_script_contribution() {
    let dir = temp_dir("script-isolation");
    let records = vec![record("1", "a")];
    let export = export_artifact(records);
    let reader = Arc::new(FixedExportReader(export));
    let writer = Arc::new(CapturingWriter { dir: dir.clone() });
    let validator = Arc::new(SchemaValidator::new().unwrap());
    let engine = AnalysisEngine::new(
        reader,
        writer,
        validator,
        AnalysisConfig {
            output_dir: dir.display().to_string(),
            concurrency: 2,
            categorizer: Default::default(),
            scorer: Default::default(),
            scripts: vec![],
        },
    );
    let analyzers: Vec<AnalyzerHandle> = vec![AnalyzerHandle::Job(Box::new(AlwaysFailingScript))];
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<AnalysisEvent>();
    let cancel = archivist_application::cancel::CancelToken::new();
    let path = engine.run(std::path::Path::new("unused"), analyzers, tx, cancel).await.unwrap();
    let artifact: AnalysisArtifact = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(artifact.bookmarks.len(), 1);
    assert!(artifact.bookmarks[0].custom_analysis.is_none());
    assert_eq!(artifact.metadata.error_summary.unwrap().incidents.len(), 1);
    std::fs::remove_dir_all(&dir).ok();
}
