use std::sync::Arc;
use std::time::Duration;

use archivist_domain::repositories::{LanguageModelProvider, LmOptions};
use archivist_domain::services::analyzers::{RecordAnalysisResult, RecordAnalyzer};
use archivist_domain::services::scoring::{
    blend_scores, engagement_score, heuristic_score, parse_and_clamp_lm_score, quality_score, recency_score,
    ScoringWeights,
};
use archivist_domain::value_objects::Record;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Which scoring method the configured job uses (§4.7), mirroring
/// `ScoringMethodConfig` one layer down in the domain/application split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMethod {
    Llm,
    Heuristic,
    Hybrid,
    None,
}

/// C9: scores each record's usefulness. `Llm` and `Hybrid` fall back to
/// the heuristic (or heuristic-only, for hybrid) on model failure rather
/// than leaving the field unset, recording an incident either way.
pub struct UsefulnessScorer {
    method: ScoringMethod,
    weights: ScoringWeights,
    mix: f64,
    provider: Option<Arc<dyn LanguageModelProvider>>,
    model_id: String,
    timeout: Duration,
}

impl UsefulnessScorer {
    pub fn new(
        method: ScoringMethod,
        weights: ScoringWeights,
        mix: f64,
        provider: Option<Arc<dyn LanguageModelProvider>>,
        model_id: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self { method, weights, mix, provider, model_id: model_id.into(), timeout }
    }

    fn heuristic_for(&self, record: &Record) -> u8 {
        let engagement =
            engagement_score(record.like_count.unwrap_or(0), record.retweet_count.unwrap_or(0), record.reply_count.unwrap_or(0));
        let recency = recency_score(age_hours(record), 24.0);
        let quality = quality_score(record.text.as_deref());
        heuristic_score(engagement, recency, quality, &self.weights)
    }

    async fn lm_score(&self, record: &Record) -> Option<u8> {
        let provider = self.provider.as_ref()?;
        let prompt = format!(
            "Rate how useful this bookmarked post is on a scale of 0 to 100. Respond with only the number.\n\nText: {}",
            record.text.as_deref().unwrap_or("")
        );
        let options = LmOptions { timeout: self.timeout, max_tokens: None };
        let text = provider.complete(&prompt, &self.model_id, &options).await.ok()?;
        parse_and_clamp_lm_score(&text)
    }
}

fn age_hours(record: &Record) -> f64 {
    match DateTime::parse_from_rfc3339(&record.created_at) {
        Ok(created) => {
            let created: DateTime<Utc> = created.with_timezone(&Utc);
            (Utc::now() - created).num_seconds() as f64 / 3600.0
        }
        Err(_) => 0.0,
    }
}

#[async_trait]
impl RecordAnalyzer for UsefulnessScorer {
    fn name(&self) -> &str {
        "usefulness-scorer"
    }

    async fn analyze(&self, record: &Record) -> RecordAnalysisResult {
        match self.method {
            ScoringMethod::None => RecordAnalysisResult::ok(),
            ScoringMethod::Heuristic => {
                RecordAnalysisResult { usefulness_score: Some(self.heuristic_for(record)), ..RecordAnalysisResult::ok() }
            }
            ScoringMethod::Llm => match self.lm_score(record).await {
                Some(score) => RecordAnalysisResult { usefulness_score: Some(score), ..RecordAnalysisResult::ok() },
                None => RecordAnalysisResult {
                    // Pure-LM mode always contributes a value (open question 2): on
                    // failure that's a defined default of 0, not a silent omission.
                    usefulness_score: Some(0),
                    failure: Some("language model scoring unavailable, defaulted to 0".to_string()),
                    ..RecordAnalysisResult::ok()
                },
            },
            ScoringMethod::Hybrid => {
                let heuristic = self.heuristic_for(record);
                match self.lm_score(record).await {
                    Some(lm) => RecordAnalysisResult {
                        usefulness_score: Some(blend_scores(heuristic, lm, self.mix)),
                        ..RecordAnalysisResult::ok()
                    },
                    None => RecordAnalysisResult {
                        usefulness_score: Some(heuristic),
                        failure: Some("language model scoring unavailable, used heuristic-only fallback".to_string()),
                        ..RecordAnalysisResult::ok()
                    },
                }
            }
        }
    }
}
