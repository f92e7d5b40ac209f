use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use archivist_application::analysis::AnalysisEngine;
use archivist_application::cancel::CancelToken;
use archivist_application::config::{self, ScoringMethodConfig};
use archivist_application::export::ExportEngine;
use archivist_application::validation::SchemaValidator;
use archivist_domain::events::{AnalysisEvent, ExportEvent};
use archivist_domain::repositories::Credentials;
use archivist_domain::services::analyzers::AnalyzerHandle;
use archivist_infrastructure::analyzers::{LmCategorizer, ScriptRunner, ScoringMethod, UsefulnessScorer};
use archivist_infrastructure::artifacts::{FilesystemArtifactReader, FilesystemArtifactWriter};
use archivist_infrastructure::gateway::HttpApiGateway;
use archivist_infrastructure::language_model::HttpLanguageModelProvider;
use archivist_infrastructure::state_store::FilesystemExportStateStore;
use clap::{Parser, Subcommand};

/// Wires the Export and Analysis engines to the reference HTTP/filesystem
/// adapters. The remote wire shape, the LM transport, and credential
/// acquisition are all explicitly out of scope here: this binary reads
/// them from environment variables rather than implementing a real
/// resolution chain, matching the engines' own view of them as
/// injectable capabilities (§6).
#[derive(Parser, Debug)]
#[command(name = "archivist-cli", about = "Bookmark export and analysis pipeline", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the resumable export pipeline and write an export artifact.
    Export {
        #[arg(long)]
        config: PathBuf,
    },
    /// Run the analysis pipeline over a previously written export artifact.
    Analyze {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        export_path: PathBuf,
    },
}

fn main() {
    init_tracing();
    init_metrics();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| {
            eprintln!("error: unable to start async runtime: {err}");
            std::process::exit(1);
        });

    let result = match cli.command {
        Command::Export { config } => runtime.block_on(run_export(config)),
        Command::Analyze { config, export_path } => runtime.block_on(run_analyze(config, export_path)),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run_export(config_path: PathBuf) -> Result<(), String> {
    let engine_config = config::load_config(&config_path)?;
    let base_url = require_env("ARCHIVIST_API_BASE_URL")?;
    let api_key = require_env("ARCHIVIST_API_KEY")?;

    let gateway = Arc::new(HttpApiGateway::new(base_url));
    let state_store = Arc::new(FilesystemExportStateStore::new(
        PathBuf::from(&engine_config.export.output_dir).join(".export-state.json"),
    ));
    let writer = Arc::new(FilesystemArtifactWriter::new(PathBuf::from(&engine_config.export.output_dir)));
    let validator = Arc::new(SchemaValidator::new()?);

    let engine = ExportEngine::new(gateway, state_store, writer, validator, engine_config.export);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_export_event(&event);
        }
    });

    let outcome = engine
        .run(&Credentials(api_key), tx, CancelToken::new())
        .await
        .map_err(|err| err.to_string())?;

    match outcome {
        archivist_application::export::ExportOutcome::Completed(path) => {
            println!("{}", path.display());
            Ok(())
        }
        archivist_application::export::ExportOutcome::Cancelled => Err("export was cancelled".to_string()),
    }
}

async fn run_analyze(config_path: PathBuf, export_path: PathBuf) -> Result<(), String> {
    let engine_config = config::load_config(&config_path)?;
    let analysis_config = engine_config.analysis;
    let validator = Arc::new(SchemaValidator::new()?);

    let lm_provider = std::env::var("ARCHIVIST_LM_BASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|base_url| Arc::new(HttpLanguageModelProvider::new(base_url)) as Arc<dyn archivist_domain::repositories::LanguageModelProvider>);

    let mut analyzers = Vec::new();

    if analysis_config.categorizer.enabled {
        let provider = lm_provider.clone().ok_or_else(|| {
            "analysis.categorizer is enabled but ARCHIVIST_LM_BASE_URL is not set".to_string()
        })?;
        let categorizer = LmCategorizer::new(
            provider,
            analysis_config.categorizer.model_id.clone().unwrap_or_default(),
            analysis_config.categorizer.system_prompt.clone().unwrap_or_default(),
            analysis_config.categorizer.max_categories,
            std::time::Duration::from_millis(analysis_config.categorizer.timeout_ms),
        );
        analyzers.push(AnalyzerHandle::Record(Box::new(categorizer)));
    }

    if analysis_config.scorer.enabled {
        let method = match analysis_config.scorer.method {
            ScoringMethodConfig::Llm => ScoringMethod::Llm,
            ScoringMethodConfig::Heuristic => ScoringMethod::Heuristic,
            ScoringMethodConfig::Hybrid => ScoringMethod::Hybrid,
            ScoringMethodConfig::None => ScoringMethod::None,
        };
        let weights = archivist_domain::services::scoring::ScoringWeights {
            engagement: analysis_config.scorer.weights.engagement,
            recency: analysis_config.scorer.weights.recency,
            quality: analysis_config.scorer.weights.quality,
        };
        let scorer = UsefulnessScorer::new(
            method,
            weights,
            analysis_config.scorer.mix,
            lm_provider.clone(),
            analysis_config.scorer.model_id.clone().unwrap_or_default(),
            std::time::Duration::from_millis(analysis_config.scorer.timeout_ms),
        );
        analyzers.push(AnalyzerHandle::Record(Box::new(scorer)));
    }

    for script in &analysis_config.scripts {
        analyzers.push(AnalyzerHandle::Job(Box::new(ScriptRunner::new(script, validator.clone()))));
    }

    let reader = Arc::new(FilesystemArtifactReader::new());
    let writer = Arc::new(FilesystemArtifactWriter::new(PathBuf::from(&analysis_config.output_dir)));
    let engine = AnalysisEngine::new(reader, writer, validator, analysis_config);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_analysis_event(&event);
        }
    });

    let path = engine
        .run(&export_path, analyzers, tx, CancelToken::new())
        .await
        .map_err(|err| err.to_string())?;
    println!("{}", path.display());
    Ok(())
}

fn log_export_event(event: &ExportEvent) {
    match event {
        ExportEvent::PageFetched { cursor, records_in_page, processed_count } => {
            tracing::info!(?cursor, records_in_page, processed_count, "fetched page");
        }
        ExportEvent::RateLimitWait { reset_at } => tracing::warn!(%reset_at, "waiting for rate limit reset"),
        ExportEvent::Completed { total_count } => tracing::info!(total_count, "export completed"),
        ExportEvent::Aborted { reason } => tracing::warn!(%reason, "export aborted"),
    }
}

fn log_analysis_event(event: &AnalysisEvent) {
    match event {
        AnalysisEvent::RecordProcessed { processed_count, total_count } => {
            tracing::info!(processed_count, total_count, "analyzed record")
        }
        AnalysisEvent::RecordAnalyzerFailed { record_id, analyzer, message } => {
            tracing::warn!(record_id, analyzer, message, "record analyzer failed")
        }
        AnalysisEvent::ScriptFailed { script_name, message } => {
            tracing::warn!(script_name, message, "script analyzer failed")
        }
        AnalysisEvent::Completed { total_count } => tracing::info!(total_count, "analysis completed"),
        AnalysisEvent::Aborted { reason, last_processed_index } => {
            tracing::warn!(reason, last_processed_index, "analysis aborted")
        }
    }
}

fn require_env(name: &'static str) -> Result<String, String> {
    std::env::var(name).map_err(|_| format!("missing required environment variable {name}"))
}

fn init_tracing() {
    let filter = std::env::var("ARCHIVIST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[cfg(feature = "prometheus")]
fn init_metrics() {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = std::env::var("ARCHIVIST_METRICS_ADDR").ok().filter(|v| !v.trim().is_empty()) else {
        return;
    };
    match raw.parse::<SocketAddr>() {
        Ok(addr) => match PrometheusBuilder::new().with_http_listener(addr).install() {
            Ok(()) => tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled"),
            Err(err) => tracing::warn!(%err, "failed to install prometheus exporter"),
        },
        Err(err) => tracing::warn!(%err, "invalid ARCHIVIST_METRICS_ADDR"),
    }
}

#[cfg(not(feature = "prometheus"))]
fn init_metrics() {}
