use archivist_domain::errors::GatewayError;
use archivist_domain::services::rate_governor::{backoff_delay, retries_exhausted, BackoffConfig};
use archivist_domain::value_objects::RateLimitInfo;
use chrono::Utc;

/// C2: the stateful half of the Rate Governor. The schedule itself
/// (`backoff_delay`) is a pure domain function; this wrapper owns the
/// latest observed rate-limit state and the retry counter, and performs
/// the actual suspension, generalizing the retry-with-backoff loop in
/// the teacher's KuCoin ingestion (`fetch_kucoin_spot`/`fetch_kucoin_futures`).
pub struct RateGovernor {
    config: BackoffConfig,
    latest: Option<RateLimitInfo>,
    retry_counter: u32,
}

impl RateGovernor {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, latest: None, retry_counter: 0 }
    }

    /// Cooperatively suspends until policy permits the next request.
    /// Returns the instant waited for, if any, so the caller can emit a
    /// progress event.
    pub async fn before_request(&mut self) -> Option<chrono::DateTime<Utc>> {
        let info = self.latest?;
        if !info.is_exhausted() {
            return None;
        }
        let now = Utc::now();
        if info.reset_at <= now {
            return None;
        }
        let wait = (info.reset_at - now).to_std().unwrap_or(std::time::Duration::ZERO);
        tokio::time::sleep(wait).await;
        Some(info.reset_at)
    }

    /// Updates the latest rate-limit snapshot and resets the retry
    /// counter after a successful request.
    pub fn observe_success(&mut self, rate_limit: Option<RateLimitInfo>) {
        if let Some(info) = rate_limit {
            self.latest = Some(info);
        }
        self.retry_counter = 0;
    }

    /// Applies backoff for a transient failure (network error or 5xx).
    /// Errs with a terminal `GatewayError` once `maxRetries` is exceeded.
    pub async fn observe_transient_failure(&mut self) -> Result<(), GatewayError> {
        if retries_exhausted(self.retry_counter, &self.config) {
            return Err(GatewayError::TransientTransport(format!(
                "exceeded {} retries",
                self.config.max_retries
            )));
        }
        let delay = backoff_delay(self.retry_counter, &self.config);
        self.retry_counter += 1;
        tokio::time::sleep(delay).await;
        Ok(())
    }

    pub fn retry_counter(&self) -> u32 {
        self.retry_counter
    }
}
