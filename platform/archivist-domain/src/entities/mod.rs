mod analysis;
mod error_summary;
mod export;

pub use analysis::{AnalysisArtifact, AnalysisMetadata, EnrichedRecord, ScoringMethod};
pub use error_summary::{ErrorIncident, ErrorLevel, ErrorSummary};
pub use export::{ExportArtifact, ExportMetadata};
