use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use archivist_domain::entities::{
    AnalysisArtifact, AnalysisMetadata, EnrichedRecord, ErrorIncident, ErrorLevel, ErrorSummary, ScoringMethod,
};
use archivist_domain::errors::AnalysisError;
use archivist_domain::events::AnalysisEvent;
use archivist_domain::repositories::{ArtifactReader, ArtifactWriter};
use archivist_domain::services::analyzers::{AnalyzerHandle, JobAnalyzer, RecordAnalyzer};
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;

use crate::cancel::CancelToken;
use crate::config::{AnalysisConfig, ScoringMethodConfig};
use crate::naming::timestamp_basename;
use crate::validation::SchemaValidator;

/// C7: reads the export artifact, drives analyzers over each record with
/// bounded concurrency, merges results, and emits the analysis artifact.
pub struct AnalysisEngine {
    reader: Arc<dyn ArtifactReader>,
    writer: Arc<dyn ArtifactWriter>,
    validator: Arc<SchemaValidator>,
    config: AnalysisConfig,
}

impl AnalysisEngine {
    pub fn new(
        reader: Arc<dyn ArtifactReader>,
        writer: Arc<dyn ArtifactWriter>,
        validator: Arc<SchemaValidator>,
        config: AnalysisConfig,
    ) -> Self {
        Self { reader, writer, validator, config }
    }

    pub async fn run(
        &self,
        export_path: &std::path::Path,
        analyzers: Vec<AnalyzerHandle>,
        events: UnboundedSender<AnalysisEvent>,
        cancel: CancelToken,
    ) -> Result<PathBuf, AnalysisError> {
        let export_artifact = self.reader.read_export(export_path).await.map_err(AnalysisError::Filesystem)?;
        let export_value =
            serde_json::to_value(&export_artifact).map_err(|e| AnalysisError::Schema(e.to_string()))?;
        self.validator.validate_export(&export_value).map_err(|issues| {
            AnalysisError::Schema(issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))
        })?;

        let mut incidents = Vec::new();
        let mut record_analyzers: Vec<Arc<dyn RecordAnalyzer>> = Vec::new();
        let mut job_analyzers: Vec<Arc<dyn JobAnalyzer>> = Vec::new();

        for handle in analyzers {
            match handle {
                AnalyzerHandle::Record(analyzer) => {
                    let analyzer: Arc<dyn RecordAnalyzer> = Arc::from(analyzer);
                    match analyzer.initialize().await {
                        Ok(()) => record_analyzers.push(analyzer),
                        Err(err) => incidents.push(initialization_incident(analyzer.name(), &err.to_string())),
                    }
                }
                AnalyzerHandle::Job(analyzer) => {
                    let analyzer: Arc<dyn JobAnalyzer> = Arc::from(analyzer);
                    match analyzer.initialize().await {
                        Ok(()) => job_analyzers.push(analyzer),
                        Err(err) => incidents.push(initialization_incident(analyzer.name(), &err.to_string())),
                    }
                }
            }
        }

        let total_count = export_artifact.bookmarks.len();
        let mut enriched_records: Vec<EnrichedRecord> =
            export_artifact.bookmarks.iter().cloned().map(EnrichedRecord::from_record).collect();

        let mut categories_applied = BTreeSet::new();
        let mut analyzers_used: HashSet<String> = HashSet::new();
        let mut processed_count = 0usize;
        let mut aborted = false;

        if !record_analyzers.is_empty() {
            let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
            let mut handles = Vec::with_capacity(total_count);
            for record in export_artifact.bookmarks.iter().cloned() {
                let analyzers = record_analyzers.clone();
                let semaphore = semaphore.clone();
                handles.push(tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
                    let mut categories: Option<Vec<String>> = None;
                    let mut usefulness_score: Option<u8> = None;
                    let mut custom_fields: Option<Map<String, Value>> = None;
                    let mut local_incidents = Vec::new();
                    let mut contributors = Vec::new();
                    for analyzer in analyzers.iter() {
                        let result = analyzer.analyze(&record).await;
                        if let Some(cats) = result.categories {
                            categories = Some(cats);
                            contributors.push(analyzer.name().to_string());
                        }
                        if let Some(score) = result.usefulness_score {
                            usefulness_score = Some(score);
                            contributors.push(analyzer.name().to_string());
                        }
                        if let Some(fields) = result.custom_fields {
                            custom_fields.get_or_insert_with(Map::new).insert(
                                analyzer.name().to_string(),
                                Value::Object(fields),
                            );
                            contributors.push(analyzer.name().to_string());
                        }
                        if let Some(failure) = result.failure {
                            local_incidents.push(ErrorIncident {
                                timestamp: Utc::now(),
                                level: ErrorLevel::Warn,
                                operation: "analyze_record".to_string(),
                                record_id: Some(record.id.clone()),
                                analyzer: Some(analyzer.name().to_string()),
                                message: failure,
                            });
                        }
                    }
                    (categories, usefulness_score, custom_fields, local_incidents, contributors)
                }));
            }

            for (idx, handle) in handles.into_iter().enumerate() {
                if cancel.is_cancelled() {
                    handle.abort();
                    aborted = true;
                    continue;
                }
                let (categories, usefulness_score, custom_fields, local_incidents, contributors) =
                    match handle.await {
                        Ok(result) => result,
                        Err(_) => {
                            aborted = true;
                            continue;
                        }
                    };
                if let Some(cats) = categories {
                    categories_applied.extend(cats.iter().cloned());
                    enriched_records[idx].categories = Some(cats);
                }
                if let Some(score) = usefulness_score {
                    enriched_records[idx].usefulness_score = Some(score);
                }
                if let Some(fields) = custom_fields {
                    enriched_records[idx].custom_analysis = Some(fields);
                }
                analyzers_used.extend(contributors);
                incidents.extend(local_incidents);
                processed_count = idx + 1;
                events.send(AnalysisEvent::RecordProcessed { processed_count, total_count }).ok();
            }
        } else {
            processed_count = total_count;
        }

        if !aborted {
            for analyzer in &job_analyzers {
                match analyzer.analyze(&export_artifact).await {
                    Ok(result) => {
                        if !result.per_record_fields.is_empty() {
                            analyzers_used.insert(analyzer.name().to_string());
                        }
                        for enriched in enriched_records.iter_mut() {
                            if let Some(fields) = result.per_record_fields.get(enriched.id()) {
                                enriched
                                    .custom_analysis
                                    .get_or_insert_with(Map::new)
                                    .insert(analyzer.name().to_string(), Value::Object(fields.clone()));
                            }
                        }
                    }
                    Err(err) => {
                        events
                            .send(AnalysisEvent::ScriptFailed {
                                script_name: analyzer.name().to_string(),
                                message: err.message.clone(),
                            })
                            .ok();
                        incidents.push(ErrorIncident {
                            timestamp: Utc::now(),
                            level: ErrorLevel::Warn,
                            operation: "analyze_job".to_string(),
                            record_id: None,
                            analyzer: Some(analyzer.name().to_string()),
                            message: err.message,
                        });
                    }
                }
            }
        }

        let scoring_method = match self.config.scorer.method {
            ScoringMethodConfig::Llm => ScoringMethod::Llm,
            ScoringMethodConfig::Heuristic => ScoringMethod::Heuristic,
            ScoringMethodConfig::Hybrid => ScoringMethod::Hybrid,
            ScoringMethodConfig::None => ScoringMethod::None,
        };

        let error_summary = if aborted {
            Some(ErrorSummary {
                incidents,
                abort_reason: Some("cancelled".to_string()),
                last_processed_index: Some(processed_count.saturating_sub(1)),
            })
        } else if !incidents.is_empty() {
            Some(ErrorSummary { incidents, abort_reason: None, last_processed_index: None })
        } else {
            None
        };

        let metadata = AnalysisMetadata {
            export: export_artifact.metadata.clone(),
            analysis_timestamp: Utc::now(),
            categories_applied,
            scoring_method,
            analyzers_used: analyzers_used.into_iter().collect(),
            error_summary,
        };
        let artifact = AnalysisArtifact { metadata, bookmarks: enriched_records };

        let basename = timestamp_basename(artifact.metadata.analysis_timestamp);

        if aborted {
            events
                .send(AnalysisEvent::Aborted {
                    reason: "cancelled".to_string(),
                    last_processed_index: processed_count.saturating_sub(1),
                })
                .ok();
            return self.writer.write_analysis(&artifact, &basename, true).await.map_err(AnalysisError::Filesystem);
        }

        let value = serde_json::to_value(&artifact).map_err(|e| AnalysisError::Schema(e.to_string()))?;
        self.validator.validate_analysis(&value).map_err(|issues| {
            AnalysisError::Schema(issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))
        })?;

        let path = self.writer.write_analysis(&artifact, &basename, false).await.map_err(AnalysisError::Filesystem)?;
        events.send(AnalysisEvent::Completed { total_count: artifact.bookmarks.len() }).ok();
        Ok(path)
    }
}

fn initialization_incident(analyzer_name: &str, message: &str) -> ErrorIncident {
    ErrorIncident {
        timestamp: Utc::now(),
        level: ErrorLevel::Error,
        operation: "initialize".to_string(),
        record_id: None,
        analyzer: Some(analyzer_name.to_string()),
        message: message.to_string(),
    }
}
