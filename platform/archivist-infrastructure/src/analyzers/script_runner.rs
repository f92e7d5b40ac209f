use std::collections::{HashMap, HashSet};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use archivist_application::config::ScriptConfig;
use archivist_application::validation::SchemaValidator;
use archivist_domain::entities::ExportArtifact;
use archivist_domain::errors::AnalyzerError;
use archivist_domain::services::analyzers::{JobAnalysisResult, JobAnalyzer};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// C10: a job-scoped analyzer that pipes the export artifact's JSON to an
/// external script's stdin and reads a `{ recordId: { ...fields } }` map
/// back from stdout. Timeout, output-size overrun, and a nonzero exit are
/// all fatal to this script's contribution only (Property 11) -- never to
/// the job as a whole. Grounded on the subprocess-timeout-and-kill
/// convention of `dashflow-shell-tool`, generalized from its sync
/// `Command`/`wait_timeout` loop to `tokio::process` + `tokio::time::timeout`.
pub struct ScriptRunner {
    name: String,
    command: String,
    args: Vec<String>,
    working_dir: Option<String>,
    timeout: Duration,
    max_output_bytes: usize,
    validator: Arc<SchemaValidator>,
}

impl ScriptRunner {
    pub fn new(config: &ScriptConfig, validator: Arc<SchemaValidator>) -> Self {
        Self {
            name: config.name.clone(),
            command: config.command.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            max_output_bytes: config.max_output_bytes,
            validator,
        }
    }

    async fn run_once(&self, artifact: &ExportArtifact) -> Result<Map<String, Value>, String> {
        let mut command = tokio::process::Command::new(&self.command);
        command.args(&self.args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command.stdin(Stdio::piped());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| format!("failed to spawn script: {e}"))?;
        let input = serde_json::to_vec(artifact).map_err(|e| e.to_string())?;
        let mut stdin = child.stdin.take().ok_or_else(|| "script stdin unavailable".to_string())?;
        let mut stdout = child.stdout.take().ok_or_else(|| "script stdout unavailable".to_string())?;
        let mut stderr = child.stderr.take().ok_or_else(|| "script stderr unavailable".to_string())?;
        let max_bytes = self.max_output_bytes;

        let write_stdin = async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result.map_err(|e| format!("failed to write script stdin: {e}"))
        };

        let read_stdout = async move {
            let mut buffer = Vec::new();
            let mut chunk = [0u8; 8192];
            loop {
                let read = stdout.read(&mut chunk).await.map_err(|e| format!("failed to read script stdout: {e}"))?;
                if read == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..read]);
                if buffer.len() > max_bytes {
                    return Err(format!("script output exceeded {max_bytes} bytes"));
                }
            }
            Ok(buffer)
        };

        let drain_stderr = async move {
            let mut sink = Vec::new();
            let _ = stderr.read_to_end(&mut sink).await;
            sink
        };

        // stdin-write, stdout-read, and stderr-drain run concurrently so a
        // script that streams output while we're still writing its input
        // never deadlocks on a full OS pipe buffer.
        let joined = async { tokio::join!(write_stdin, read_stdout, drain_stderr) };

        let buffer = match tokio::time::timeout(self.timeout, joined).await {
            Ok((write_result, read_result, _stderr)) => {
                write_result?;
                read_result?
            }
            Err(_) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
                return Err(format!("script timed out after {:?}", self.timeout));
            }
        };

        let status = child.wait().await.map_err(|e| format!("failed to wait for script: {e}"))?;
        if !status.success() {
            return Err(format!("script exited with {status}"));
        }

        let parsed: Value = serde_json::from_slice(&buffer).map_err(|e| format!("script output was not valid JSON: {e}"))?;
        self.validator.validate_script_output(&parsed).map_err(|issues| {
            let detail: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
            format!("script output failed schema validation: {}", detail.join("; "))
        })?;
        parsed.as_object().cloned().ok_or_else(|| "script output was not a JSON object".to_string())
    }
}

#[async_trait]
impl JobAnalyzer for ScriptRunner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, artifact: &ExportArtifact) -> Result<JobAnalysisResult, AnalyzerError> {
        let known_ids: HashSet<&str> = artifact.bookmarks.iter().map(|r| r.id.as_str()).collect();
        let fields = self
            .run_once(artifact)
            .await
            .map_err(|message| AnalyzerError { analyzer: self.name.clone(), message })?;

        let mut per_record_fields = HashMap::new();
        for (id, value) in fields {
            if !known_ids.contains(id.as_str()) {
                tracing::warn!(analyzer = %self.name, record_id = %id, "script output referenced an unknown record id, ignoring");
                continue;
            }
            match value {
                Value::Object(map) => {
                    per_record_fields.insert(id, map);
                }
                _ => {
                    tracing::warn!(analyzer = %self.name, record_id = %id, "script output entry was not an object, ignoring");
                }
            }
        }
        Ok(JobAnalysisResult { per_record_fields })
    }
}
