use async_trait::async_trait;

use crate::value_objects::ExportState;

/// C3: persists `{lastCursor, processedCount, startTime, apiVersion}` to a
/// fixed location. Writes are atomic (write to a temporary sibling and
/// rename). Owned exclusively by the Export Engine.
#[async_trait]
pub trait ExportStateStore: Send + Sync {
    /// Absent when the file is missing or unparseable (the latter also
    /// logs, left to the implementation).
    async fn load(&self) -> Result<Option<ExportState>, String>;
    async fn save(&self, state: &ExportState) -> Result<(), String>;
    /// Deletes the marker. Absence after clear is not an error.
    async fn clear(&self) -> Result<(), String>;
}
