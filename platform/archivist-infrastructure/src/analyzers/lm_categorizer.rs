use std::sync::Arc;
use std::time::Duration;

use archivist_domain::repositories::{LanguageModelProvider, LmOptions};
use archivist_domain::services::analyzers::{RecordAnalysisResult, RecordAnalyzer};
use archivist_domain::services::categorize::{normalize_categories, parse_labels, UNCATEGORIZED};
use archivist_domain::value_objects::Record;
use async_trait::async_trait;

/// C8: labels each record via a language model. Falls back to a single
/// `uncategorized` label, with an incident recorded, when the model is
/// unreachable or its response carries no parseable labels after one
/// retry (§4.6).
pub struct LmCategorizer {
    provider: Arc<dyn LanguageModelProvider>,
    model_id: String,
    system_prompt: String,
    max_categories: usize,
    timeout: Duration,
}

impl LmCategorizer {
    pub fn new(
        provider: Arc<dyn LanguageModelProvider>,
        model_id: impl Into<String>,
        system_prompt: impl Into<String>,
        max_categories: usize,
        timeout: Duration,
    ) -> Self {
        Self { provider, model_id: model_id.into(), system_prompt: system_prompt.into(), max_categories, timeout }
    }

    fn prompt_for(&self, record: &Record) -> String {
        format!("{}\n\nText: {}", self.system_prompt, record.text.as_deref().unwrap_or(""))
    }

    async fn attempt(&self, record: &Record) -> Result<Vec<String>, String> {
        let prompt = self.prompt_for(record);
        let options = LmOptions { timeout: self.timeout, max_tokens: None };
        let text = self.provider.complete(&prompt, &self.model_id, &options).await?;
        let labels = normalize_categories(parse_labels(&text), self.max_categories);
        if labels.is_empty() {
            Err("language model returned no parseable labels".to_string())
        } else {
            Ok(labels)
        }
    }
}

#[async_trait]
impl RecordAnalyzer for LmCategorizer {
    fn name(&self) -> &str {
        "lm-categorizer"
    }

    async fn analyze(&self, record: &Record) -> RecordAnalysisResult {
        match self.attempt(record).await {
            Ok(labels) => RecordAnalysisResult { categories: Some(labels), ..RecordAnalysisResult::ok() },
            Err(first_error) => match self.attempt(record).await {
                Ok(labels) => RecordAnalysisResult { categories: Some(labels), ..RecordAnalysisResult::ok() },
                Err(second_error) => {
                    tracing::warn!(analyzer = "lm-categorizer", record_id = %record.id, %first_error, %second_error, "falling back to uncategorized");
                    RecordAnalysisResult {
                        categories: Some(vec![UNCATEGORIZED.to_string()]),
                        failure: Some(format!("{first_error}; retry: {second_error}")),
                        ..RecordAnalysisResult::ok()
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    struct FakeProvider {
        responses: Mutex<VecDeque<Result<String, String>>>,
    }

    impl FakeProvider {
        fn new(responses: Vec<Result<String, String>>) -> Self {
            Self { responses: Mutex::new(responses.into()) }
        }
    }

    #[async_trait]
    impl LanguageModelProvider for FakeProvider {
        async fn complete(&self, _prompt: &str, _model_id: &str, _options: &LmOptions) -> Result<String, String> {
            self.responses.lock().await.pop_front().unwrap_or_else(|| Err("exhausted".to_string()))
        }
    }

    fn sample_record() -> Record {
        Record {
            id: "1".to_string(),
            url: None,
            text: Some("an interesting post about rust".to_string()),
            author_username: None,
            author_name: None,
            created_at: "2024-01-15T10:00:00Z".to_string(),
            like_count: None,
            retweet_count: None,
            reply_count: None,
        }
    }

    #[tokio::test]
    async fn labels_from_first_successful_response() {
        let provider = Arc::new(FakeProvider::new(vec![Ok("tech, rust".to_string())]));
        let categorizer = LmCategorizer::new(provider, "model", "classify", 5, Duration::from_secs(5));
        let result = categorizer.analyze(&sample_record()).await;
        assert_eq!(result.categories, Some(vec!["tech".to_string(), "rust".to_string()]));
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn retries_once_before_falling_back() {
        let provider = Arc::new(FakeProvider::new(vec![Err("timeout".to_string()), Ok("science".to_string())]));
        let categorizer = LmCategorizer::new(provider, "model", "classify", 5, Duration::from_secs(5));
        let result = categorizer.analyze(&sample_record()).await;
        assert_eq!(result.categories, Some(vec!["science".to_string()]));
    }

    #[tokio::test]
    async fn falls_back_to_uncategorized_after_exhausting_retry() {
        let provider = Arc::new(FakeProvider::new(vec![Err("down".to_string()), Err("still down".to_string())]));
        let categorizer = LmCategorizer::new(provider, "model", "classify", 5, Duration::from_secs(5));
        let result = categorizer.analyze(&sample_record()).await;
        assert_eq!(result.categories, Some(vec![UNCATEGORIZED.to_string()]));
        assert!(result.failure.is_some());
    }

    #[tokio::test]
    async fn unparseable_response_is_treated_as_failure() {
        let provider = Arc::new(FakeProvider::new(vec![Ok("   ".to_string()), Ok("".to_string())]));
        let categorizer = LmCategorizer::new(provider, "model", "classify", 5, Duration::from_secs(5));
        let result = categorizer.analyze(&sample_record()).await;
        assert_eq!(result.categories, Some(vec![UNCATEGORIZED.to_string()]));
    }
}
