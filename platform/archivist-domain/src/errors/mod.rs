use std::fmt;

/// Error taxonomy from the error-handling design: the *kind* of failure
/// drives retry/abort policy independently of which component raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Remote says the caller is not authenticated or not authorized.
    /// Non-retryable; aborts the export.
    Credential(String),
    /// Remote asked the caller to wait. Not surfaced as a caller-visible
    /// error; the Rate Governor handles it internally.
    RateLimited { retry_after: Option<chrono::DateTime<chrono::Utc>> },
    /// Network error or remote 5xx. Retried with backoff up to
    /// `maxRetries`, then promoted to fatal for that operation.
    TransientTransport(String),
    /// The remote returned an unparseable or schema-violating payload.
    /// Non-retryable for that page.
    Protocol(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Credential(msg) => write!(f, "credential error: {msg}"),
            GatewayError::RateLimited { retry_after } => match retry_after {
                Some(at) => write!(f, "rate limited until {at}"),
                None => write!(f, "rate limited"),
            },
            GatewayError::TransientTransport(msg) => write!(f, "transient transport error: {msg}"),
            GatewayError::Protocol(msg) => write!(f, "protocol error: {msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    /// Transient errors are retried by the Rate Governor; others abort.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::TransientTransport(_))
    }
}

/// Produced artifact failed its schema, or the underlying filesystem
/// operation failed. Both are programmer/environment errors, never
/// retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    Schema(String),
    Filesystem(String),
    Gateway(GatewayError),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Schema(msg) => write!(f, "schema validation failed: {msg}"),
            ExportError::Filesystem(msg) => write!(f, "filesystem error: {msg}"),
            ExportError::Gateway(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<GatewayError> for ExportError {
    fn from(err: GatewayError) -> Self {
        ExportError::Gateway(err)
    }
}

/// A language-model or script failure. Always contained at the analyzer
/// or record boundary; never aborts the Analysis Engine by itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerError {
    pub analyzer: String,
    pub message: String,
}

impl fmt::Display for AnalyzerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "analyzer {} failed: {}", self.analyzer, self.message)
    }
}

impl std::error::Error for AnalyzerError {}

/// Failures that can abort the Analysis Engine outright: schema drift on
/// the input artifact, or a filesystem failure writing the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    Schema(String),
    Filesystem(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Schema(msg) => write!(f, "schema validation failed: {msg}"),
            AnalysisError::Filesystem(msg) => write!(f, "filesystem error: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {}
