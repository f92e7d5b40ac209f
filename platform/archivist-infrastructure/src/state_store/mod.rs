use std::path::PathBuf;

use archivist_domain::repositories::ExportStateStore;
use archivist_domain::value_objects::ExportState;
use async_trait::async_trait;

/// C3: a single fixed-path JSON file. Writes are atomic (temp file +
/// fsync + rename), grounded on the teacher-adjacent checkpoint-write
/// pattern (`dashflow`'s `atomic_write_file`) since the teacher's own
/// artifact writers do plain `fs::write`.
pub struct FilesystemExportStateStore {
    path: PathBuf,
}

impl FilesystemExportStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ExportStateStore for FilesystemExportStateStore {
    async fn load(&self) -> Result<Option<ExportState>, String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => Ok(Some(state)),
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "state marker is unparseable, treating as absent");
                    Ok(None)
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.to_string()),
        }
    }

    async fn save(&self, state: &ExportState) -> Result<(), String> {
        let json = serde_json::to_string_pretty(state).map_err(|e| e.to_string())?;
        atomic_write(&self.path, json.as_bytes()).await
    }

    async fn clear(&self) -> Result<(), String> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.to_string()),
        }
    }
}

/// Writes `contents` to `path` via a temporary sibling file, fsync, and
/// rename, so a reader never observes a partially written file.
pub async fn atomic_write(path: &std::path::Path, contents: &[u8]) -> Result<(), String> {
    let dir = path.parent().ok_or_else(|| "state path has no parent directory".to_string())?;
    tokio::fs::create_dir_all(dir).await.map_err(|e| e.to_string())?;
    let tmp_path = dir.join(format!(
        ".{}.{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("state"),
        std::process::id()
    ));
    {
        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::File::create(&tmp_path).await.map_err(|e| e.to_string())?;
        file.write_all(contents).await.map_err(|e| e.to_string())?;
        file.sync_all().await.map_err(|e| e.to_string())?;
    }
    tokio::fs::rename(&tmp_path, path).await.map_err(|e| e.to_string())?;
    Ok(())
}
