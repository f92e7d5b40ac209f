use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use archivist_domain::entities::{ExportArtifact, ExportMetadata};
use archivist_domain::errors::{ExportError, GatewayError};
use archivist_domain::events::ExportEvent;
use archivist_domain::repositories::{ApiGateway, ArtifactWriter, Credentials, ExportStateStore};
use archivist_domain::value_objects::ExportState;
use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;

use crate::cancel::CancelToken;
use crate::config::ExportConfig;
use crate::export::rate_governor::RateGovernor;
use crate::naming::timestamp_basename;
use crate::validation::SchemaValidator;

const API_VERSION: &str = "1";

pub enum ExportOutcome {
    Completed(PathBuf),
    Cancelled,
}

/// C4: orchestrates C1 (gateway) + C2 (rate governor) + C3 (state store),
/// normalizes records, validates and writes the export artifact.
/// Strictly sequential pagination by design (§4.2 concurrency note).
pub struct ExportEngine {
    gateway: Arc<dyn ApiGateway>,
    state_store: Arc<dyn ExportStateStore>,
    writer: Arc<dyn ArtifactWriter>,
    validator: Arc<SchemaValidator>,
    config: ExportConfig,
}

impl ExportEngine {
    pub fn new(
        gateway: Arc<dyn ApiGateway>,
        state_store: Arc<dyn ExportStateStore>,
        writer: Arc<dyn ArtifactWriter>,
        validator: Arc<SchemaValidator>,
        config: ExportConfig,
    ) -> Self {
        Self { gateway, state_store, writer, validator, config }
    }

    pub async fn run(
        &self,
        credentials: &Credentials,
        events: UnboundedSender<ExportEvent>,
        cancel: CancelToken,
    ) -> Result<ExportOutcome, ExportError> {
        let token = self.gateway.authenticate(credentials).await?;
        let identity = self.gateway.get_user(&token).await?;

        let resumed_state = if self.config.resume {
            self.state_store.load().await.map_err(ExportError::Filesystem)?
        } else {
            None
        };

        let start_time = resumed_state.as_ref().map(|s| s.start_time).unwrap_or_else(Utc::now);
        let mut cursor = resumed_state.as_ref().and_then(|s| s.last_cursor.clone());
        let mut bookmarks = resumed_state.as_ref().map(|s| s.bookmarks.clone()).unwrap_or_default();

        let mut governor = RateGovernor::new((&self.config.backoff).into());
        let mut seen_ids: HashSet<String> = bookmarks.iter().map(|r| r.id.clone()).collect();
        let mut seen_cursors: HashSet<String> = HashSet::new();
        let mut processed_count = bookmarks.len() as u64;

        loop {
            if cancel.is_cancelled() {
                events.send(ExportEvent::Aborted { reason: "cancelled".to_string() }).ok();
                return Ok(ExportOutcome::Cancelled);
            }

            if let Some(reset_at) = governor.before_request().await {
                events.send(ExportEvent::RateLimitWait { reset_at }).ok();
            }

            let page = loop {
                match self.gateway.get_bookmarks(&token, cursor.as_deref()).await {
                    Ok(page) => {
                        governor.observe_success(page.rate_limit);
                        break page;
                    }
                    Err(GatewayError::TransientTransport(msg)) => {
                        tracing::warn!(error = %msg, "transient transport error, retrying");
                        governor.observe_transient_failure().await?;
                    }
                    Err(other) => return Err(ExportError::from(other)),
                }
            };

            let records_in_page = page.records.len();
            for record in page.records {
                if seen_ids.insert(record.id.clone()) {
                    bookmarks.push(record);
                } else {
                    tracing::warn!(record_id = %record.id, "duplicate record id, keeping first occurrence");
                }
            }
            processed_count = bookmarks.len() as u64;

            events.send(ExportEvent::PageFetched {
                cursor: cursor.clone(),
                records_in_page,
                processed_count,
            }).ok();

            let next_cursor = page.next_cursor;
            let marker = ExportState {
                last_cursor: next_cursor.clone(),
                processed_count,
                start_time,
                api_version: API_VERSION.to_string(),
                bookmarks: bookmarks.clone(),
            };
            self.state_store.save(&marker).await.map_err(ExportError::Filesystem)?;

            match next_cursor {
                None => break,
                Some(next) => {
                    if !seen_cursors.insert(next.clone()) {
                        tracing::warn!(cursor = %next, "cursor repeated a previously seen value, terminating pagination");
                        break;
                    }
                    cursor = Some(next);
                }
            }
        }

        let metadata = ExportMetadata {
            export_timestamp: Utc::now(),
            total_count: bookmarks.len(),
            exporter_version: self.config.exporter_version.clone(),
            user_id: identity.user_id,
            username: identity.username,
        };
        let artifact = ExportArtifact::new(metadata, bookmarks);

        let value = serde_json::to_value(&artifact).map_err(|e| ExportError::Schema(e.to_string()))?;
        self.validator.validate_export(&value).map_err(|issues| {
            ExportError::Schema(issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))
        })?;

        let basename = timestamp_basename(artifact.metadata.export_timestamp);
        let path = self.writer.write_export(&artifact, &basename).await.map_err(ExportError::Filesystem)?;

        self.state_store.clear().await.map_err(ExportError::Filesystem)?;
        events.send(ExportEvent::Completed { total_count: artifact.bookmarks.len() }).ok();

        Ok(ExportOutcome::Completed(path))
    }
}
