use archivist_domain::services::rate_governor::BackoffConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffSection {
    #[serde(default = "default_base_ms")]
    pub base_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_ceiling_ms")]
    pub ceiling_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_ms() -> u64 {
    500
}
fn default_multiplier() -> f64 {
    2.0
}
fn default_ceiling_ms() -> u64 {
    60_000
}
fn default_max_retries() -> u32 {
    5
}

impl Default for BackoffSection {
    fn default() -> Self {
        Self {
            base_ms: default_base_ms(),
            multiplier: default_multiplier(),
            ceiling_ms: default_ceiling_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl From<&BackoffSection> for BackoffConfig {
    fn from(section: &BackoffSection) -> Self {
        BackoffConfig {
            base: Duration::from_millis(section.base_ms),
            multiplier: section.multiplier,
            ceiling: Duration::from_millis(section.ceiling_ms),
            max_retries: section.max_retries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    pub output_dir: String,
    #[serde(default = "default_exporter_version")]
    pub exporter_version: String,
    #[serde(default = "default_true")]
    pub resume: bool,
    #[serde(default)]
    pub backoff: BackoffSection,
}

fn default_exporter_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "lowercase")]
pub enum ScoringMethodConfig {
    Llm,
    Heuristic,
    Hybrid,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringWeightsSection {
    #[serde(default = "default_engagement_weight")]
    pub engagement: f64,
    #[serde(default = "default_recency_weight")]
    pub recency: f64,
    #[serde(default = "default_quality_weight")]
    pub quality: f64,
}

fn default_engagement_weight() -> f64 {
    0.5
}
fn default_recency_weight() -> f64 {
    0.3
}
fn default_quality_weight() -> f64 {
    0.2
}

impl Default for ScoringWeightsSection {
    fn default() -> Self {
        Self {
            engagement: default_engagement_weight(),
            recency: default_recency_weight(),
            quality: default_quality_weight(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorizerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_categories")]
    pub max_categories: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_categories() -> usize {
    5
}
fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_id: None,
            system_prompt: None,
            max_categories: default_max_categories(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScorerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_scoring_method")]
    pub method: ScoringMethodConfig,
    #[serde(default)]
    pub weights: ScoringWeightsSection,
    #[serde(default = "default_mix")]
    pub mix: f64,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_scoring_method() -> ScoringMethodConfig {
    ScoringMethodConfig::Heuristic
}
fn default_mix() -> f64 {
    0.5
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            method: default_scoring_method(),
            weights: ScoringWeightsSection::default(),
            mix: default_mix(),
            model_id: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_max_output_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub output_dir: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub categorizer: CategorizerConfig,
    #[serde(default)]
    pub scorer: ScorerConfig,
    #[serde(default)]
    pub scripts: Vec<ScriptConfig>,
}

fn default_concurrency() -> usize {
    8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub export: ExportConfig,
    pub analysis: AnalysisConfig,
}

/// Loads and parses a TOML engine configuration file, matching the
/// teacher's `load_config_with_source` shape: a malformed document or an
/// unknown field is a hard parse error, never silently ignored.
pub fn load_config_with_source(path: &Path) -> Result<(EngineConfig, String), String> {
    let source = fs::read_to_string(path).map_err(|e| format!("failed to read config {}: {e}", path.display()))?;
    let config: EngineConfig = toml::from_str(&source).map_err(|e| format!("failed to parse config: {e}"))?;
    Ok((config, source))
}

pub fn load_config(path: &Path) -> Result<EngineConfig, String> {
    load_config_with_source(path).map(|(config, _)| config)
}

pub fn to_toml_pretty(config: &EngineConfig) -> Result<String, String> {
    toml::to_string_pretty(config).map_err(|e| format!("failed to serialize config: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let toml_src = r#"
            [export]
            output_dir = "./out"

            [analysis]
            output_dir = "./out"
        "#;
        let config: EngineConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.export.output_dir, "./out");
        assert_eq!(config.analysis.concurrency, 8);
        assert!(config.analysis.categorizer.enabled);
    }

    #[test]
    fn rejects_unknown_fields() {
        let toml_src = r#"
            [export]
            output_dir = "./out"
            bogus_field = true

            [analysis]
            output_dir = "./out"
        "#;
        let result: Result<EngineConfig, _> = toml::from_str(toml_src);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        let result: Result<EngineConfig, _> = toml::from_str("not = [valid");
        assert!(result.is_err());
    }

    #[test]
    fn scripts_default_to_empty() {
        let toml_src = r#"
            [export]
            output_dir = "./out"

            [analysis]
            output_dir = "./out"
        "#;
        let config: EngineConfig = toml::from_str(toml_src).unwrap();
        assert!(config.analysis.scripts.is_empty());
    }
}
