use std::path::{Path, PathBuf};

use archivist_application::naming::collision_safe_path;
use archivist_domain::entities::{AnalysisArtifact, ExportArtifact};
use archivist_domain::repositories::{ArtifactReader, ArtifactWriter};
use async_trait::async_trait;

use crate::state_store::atomic_write;

/// C3/C7 output boundary. Grounded on the teacher's
/// `FilesystemArtifactWriter` (`platform/kairos-infrastructure/src/artifacts/mod.rs`)
/// for the metrics-wrapped-write convention, with atomic rename added
/// (the teacher's own writer uses plain `fs::write`).
pub struct FilesystemArtifactWriter {
    output_dir: PathBuf,
}

impl FilesystemArtifactWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

fn record_write_metrics(artifact_kind: &'static str, bytes: usize, elapsed: std::time::Duration) {
    metrics::counter!("archivist_artifact_writes_total", "kind" => artifact_kind).increment(1);
    metrics::histogram!("archivist_artifact_write_bytes", "kind" => artifact_kind).record(bytes as f64);
    metrics::histogram!("archivist_artifact_write_seconds", "kind" => artifact_kind).record(elapsed.as_secs_f64());
}

#[async_trait]
impl ArtifactWriter for FilesystemArtifactWriter {
    async fn write_export(&self, artifact: &ExportArtifact, basename: &str) -> Result<PathBuf, String> {
        tokio::fs::create_dir_all(&self.output_dir).await.map_err(|e| e.to_string())?;
        let path = collision_safe_path(&self.output_dir, basename, None);
        let json = serde_json::to_string_pretty(artifact).map_err(|e| e.to_string())?;
        let started = std::time::Instant::now();
        atomic_write(&path, json.as_bytes()).await?;
        record_write_metrics("export", json.len(), started.elapsed());
        tracing::info!(path = %path.display(), total_count = artifact.metadata.total_count, "wrote export artifact");
        Ok(path)
    }

    async fn write_analysis(
        &self,
        artifact: &AnalysisArtifact,
        basename: &str,
        partial: bool,
    ) -> Result<PathBuf, String> {
        tokio::fs::create_dir_all(&self.output_dir).await.map_err(|e| e.to_string())?;
        let suffix = if partial { Some("_partial") } else { None };
        let path = collision_safe_path(&self.output_dir, basename, suffix);
        let json = serde_json::to_string_pretty(artifact).map_err(|e| e.to_string())?;
        let started = std::time::Instant::now();
        atomic_write(&path, json.as_bytes()).await?;
        record_write_metrics("analysis", json.len(), started.elapsed());
        tracing::info!(path = %path.display(), partial, "wrote analysis artifact");
        Ok(path)
    }
}

/// The Analysis Engine's read-only view of a prior export artifact.
pub struct FilesystemArtifactReader;

impl FilesystemArtifactReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FilesystemArtifactReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactReader for FilesystemArtifactReader {
    async fn read_export(&self, path: &Path) -> Result<ExportArtifact, String> {
        let started = std::time::Instant::now();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| e.to_string())?;
        let artifact: ExportArtifact = serde_json::from_str(&contents).map_err(|e| e.to_string())?;
        metrics::counter!("archivist_artifact_reads_total", "kind" => "export").increment(1);
        metrics::histogram!("archivist_artifact_read_seconds", "kind" => "export").record(started.elapsed().as_secs_f64());
        Ok(artifact)
    }
}
