use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct LmOptions {
    pub timeout: Duration,
    pub max_tokens: Option<u32>,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), max_tokens: None }
    }
}

/// The language-model capability (§6). Providers are interchangeable
/// behind this interface; the concrete prompt/transport is out of scope.
#[async_trait]
pub trait LanguageModelProvider: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        model_id: &str,
        options: &LmOptions,
    ) -> Result<String, String>;
}
