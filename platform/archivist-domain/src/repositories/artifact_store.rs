use std::path::PathBuf;

use async_trait::async_trait;

use crate::entities::{AnalysisArtifact, ExportArtifact};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Export,
    Analysis,
}

/// C3/C7 shared output boundary: writes an artifact under a computed
/// basename (an RFC-3339 timestamp component) with collision-safe
/// suffixing (Property 14) — never overwrites an existing file.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    async fn write_export(&self, artifact: &ExportArtifact, basename: &str) -> Result<PathBuf, String>;
    async fn write_analysis(
        &self,
        artifact: &AnalysisArtifact,
        basename: &str,
        partial: bool,
    ) -> Result<PathBuf, String>;
}

/// The Analysis Engine's read-only view of a prior export artifact.
#[async_trait]
pub trait ArtifactReader: Send + Sync {
    async fn read_export(&self, path: &std::path::Path) -> Result<ExportArtifact, String>;
}
