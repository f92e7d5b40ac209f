use archivist_domain::repositories::{LanguageModelProvider, LmOptions};
use async_trait::async_trait;
use serde::Deserialize;

/// A reference HTTP adapter for the language-model capability (§6). The
/// concrete prompt/transport is explicitly out of scope; this is one
/// interchangeable implementation among many, grounded on the HTTP-call
/// shape of the teacher's `AgentClient`.
pub struct HttpLanguageModelProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLanguageModelProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    text: String,
}

#[async_trait]
impl LanguageModelProvider for HttpLanguageModelProvider {
    async fn complete(&self, prompt: &str, model_id: &str, options: &LmOptions) -> Result<String, String> {
        let request = self
            .client
            .post(format!("{}/complete", self.base_url))
            .json(&serde_json::json!({
                "prompt": prompt,
                "model": model_id,
                "maxTokens": options.max_tokens,
            }))
            .timeout(options.timeout);
        let response = request.send().await.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("language model request failed: {}", response.status()));
        }
        let parsed: CompletionResponse = response.json().await.map_err(|e| e.to_string())?;
        Ok(parsed.text)
    }
}
