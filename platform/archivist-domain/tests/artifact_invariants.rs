use archivist_domain::entities::{
    AnalysisArtifact, AnalysisMetadata, EnrichedRecord, ExportArtifact, ExportMetadata, ScoringMethod,
};
use archivist_domain::value_objects::Record;
use chrono::Utc;

fn sample_record(id: &str) -> Record {
    Record {
        id: id.to_string(),
        url: None,
        text: None,
        author_username: None,
        author_name: None,
        created_at: "2024-01-15T10:00:00Z".to_string(),
        like_count: Some(0),
        retweet_count: Some(0),
        reply_count: Some(0),
    }
}

#[test]
fn count_consistency_invariant() {
    let bookmarks = vec![sample_record("1"), sample_record("2")];
    let metadata = ExportMetadata {
        export_timestamp: Utc::now(),
        total_count: bookmarks.len(),
        exporter_version: "0.1.0".to_string(),
        user_id: "u1".to_string(),
        username: "user".to_string(),
    };
    let artifact = ExportArtifact::new(metadata, bookmarks);
    assert!(artifact.counts_are_consistent());
    assert!(artifact.has_unique_ids());
}

#[test]
fn duplicate_ids_are_detected() {
    let bookmarks = vec![sample_record("1"), sample_record("1")];
    let metadata = ExportMetadata {
        export_timestamp: Utc::now(),
        total_count: bookmarks.len(),
        exporter_version: "0.1.0".to_string(),
        user_id: "u1".to_string(),
        username: "user".to_string(),
    };
    let artifact = ExportArtifact::new(metadata, bookmarks);
    assert!(!artifact.has_unique_ids());
}

#[test]
fn analysis_artifact_is_bijection_with_export_ids() {
    let export_ids = vec!["1".to_string(), "2".to_string()];
    let metadata = AnalysisMetadata {
        export: ExportMetadata {
            export_timestamp: Utc::now(),
            total_count: 2,
            exporter_version: "0.1.0".to_string(),
            user_id: "u1".to_string(),
            username: "user".to_string(),
        },
        analysis_timestamp: Utc::now(),
        categories_applied: Default::default(),
        scoring_method: ScoringMethod::None,
        analyzers_used: vec![],
        error_summary: None,
    };
    let bookmarks = vec![
        EnrichedRecord::from_record(sample_record("2")),
        EnrichedRecord::from_record(sample_record("1")),
    ];
    let artifact = AnalysisArtifact { metadata, bookmarks };
    assert!(artifact.is_bijection_with(&export_ids));
}
