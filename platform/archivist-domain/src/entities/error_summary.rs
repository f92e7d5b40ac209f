use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    Info,
    Warn,
    Error,
}

/// One entry in an artifact's `errorSummary`, or one line in the error log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorIncident {
    pub timestamp: DateTime<Utc>,
    pub level: ErrorLevel,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    pub message: String,
}

/// Present on the analysis artifact only if at least one incident, or an
/// abort, occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    pub incidents: Vec<ErrorIncident>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_processed_index: Option<usize>,
}

impl ErrorSummary {
    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty() && self.abort_reason.is_none()
    }
}
