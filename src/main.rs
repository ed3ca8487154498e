//! rapport-extract CLI
//!
//! Usage:
//!   rapport-extract serve                 Start the upload interface
//!   rapport-extract extract FILE          Extract the five fields from a report
//!   rapport-extract compare FILE          Show model and pattern results side by side
//!   rapport-extract models                List known model locations
//!   rapport-extract evaluate              Score a model on the built-in cases

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use rapport_extract::api::{serve_until_shutdown, ApiContext};
use rapport_extract::config::{self, AppConfig};
use rapport_extract::pipeline::extraction::export::{render, ExportFormat};
use rapport_extract::pipeline::extraction::ExtractionPipeline;
use rapport_extract::pipeline::models::{evaluate_tagger, BUILTIN_CASES};

#[derive(Parser)]
#[command(name = "rapport-extract")]
#[command(about = "Extract structured fields from French PDF analysis reports")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Settings {
    /// Directory holding trained model sub-directories
    #[arg(long, global = true, env = "RAPPORT_MODELS_DIR")]
    models_dir: Option<PathBuf>,

    /// Directory for staged uploads
    #[arg(long, global = true, env = "RAPPORT_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Address the upload interface binds to
    #[arg(long, global = true, env = "RAPPORT_BIND", default_value = config::DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    /// Model to activate at startup (default: selection policy)
    #[arg(long = "active-model", global = true, env = "RAPPORT_MODEL")]
    active_model: Option<String>,

    /// Seconds allowed for reading one document
    #[arg(long, global = true, env = "RAPPORT_READ_TIMEOUT_SECS", default_value_t = config::DEFAULT_READ_TIMEOUT_SECS)]
    read_timeout_secs: u64,

    /// Maximum accepted upload size in bytes
    #[arg(long, global = true, env = "RAPPORT_MAX_UPLOAD_BYTES", default_value_t = config::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,
}

impl Settings {
    fn into_config(self) -> AppConfig {
        let defaults = AppConfig::default();
        AppConfig {
            models_dir: self.models_dir.unwrap_or(defaults.models_dir),
            staging_dir: self.staging_dir.unwrap_or(defaults.staging_dir),
            bind_addr: self.bind,
            preferred_model: self.active_model,
            read_timeout_secs: self.read_timeout_secs,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the upload interface
    Serve,

    /// Extract fields from a PDF report
    Extract {
        /// PDF file to read
        file: PathBuf,
        /// Output format
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
        /// Model to use for this document only
        #[arg(short, long)]
        model: Option<String>,
        /// Print only the fields, without extraction metadata
        #[arg(long)]
        no_metadata: bool,
    },

    /// Compare model and pattern results field by field
    Compare {
        /// PDF file to read
        file: PathBuf,
        /// Model to compare against the patterns
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List known model locations and their availability
    Models,

    /// Score a model on the built-in evaluation cases
    Evaluate {
        /// Model id (default: active model)
        #[arg(short, long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    rapport_extract::init_tracing();

    let cli = Cli::parse();
    let config = cli.settings.into_config();
    let pipeline = rapport_extract::bootstrap(&config);

    match cli.command {
        Commands::Serve => serve(pipeline, config).await,
        Commands::Extract {
            file,
            format,
            model,
            no_metadata,
        } => extract(&pipeline, &config, file, format, model, no_metadata).await,
        Commands::Compare { file, model } => {
            let report = pipeline
                .compare_file(&file, model.as_deref())
                .with_context(|| format!("Failed to compare {}", file.display()))?;
            for row in &report.fields {
                println!(
                    "{:<22} model={:<30} regex={:<30} winner={:?}",
                    row.field.as_str(),
                    row.model_value.as_deref().unwrap_or("-"),
                    row.regex_value.as_deref().unwrap_or("-"),
                    row.winner
                );
            }
            println!(
                "score: model={:.1} regex={:.1}",
                report.model_score, report.regex_score
            );
            Ok(())
        }
        Commands::Models => {
            let registry = pipeline.registry();
            let active = registry.active_id();
            for model in registry.list_known() {
                let marker = if active.as_deref() == Some(model.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                let status = if model.available { "available" } else { "missing" };
                println!(
                    "{marker} {:<10} {:<10} {:>8.1} MB  {}",
                    model.id,
                    status,
                    model.size_mb(),
                    model.location.display()
                );
            }
            Ok(())
        }
        Commands::Evaluate { model } => {
            let registry = pipeline.registry();
            let (id, tagger) = match model {
                Some(id) => match registry.get(&id) {
                    Some(tagger) => (id, tagger),
                    None => bail!("Model not available: {id}"),
                },
                None => match registry.active() {
                    Some(active) => active,
                    None => bail!("No model available in {}", config.models_dir.display()),
                },
            };
            let report = evaluate_tagger(&id, tagger, &BUILTIN_CASES);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn serve(pipeline: Arc<ExtractionPipeline>, config: AppConfig) -> Result<()> {
    std::fs::create_dir_all(&config.staging_dir).with_context(|| {
        format!(
            "Failed to create staging directory {}",
            config.staging_dir.display()
        )
    })?;

    let addr = config.bind_addr;
    let ctx = ApiContext::new(pipeline, config);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
        }
    };

    serve_until_shutdown(ctx, addr, shutdown)
        .await
        .map_err(anyhow::Error::msg)
}

async fn extract(
    pipeline: &Arc<ExtractionPipeline>,
    config: &AppConfig,
    file: PathBuf,
    format: ExportFormat,
    model: Option<String>,
    no_metadata: bool,
) -> Result<()> {
    let display = file.display().to_string();
    let merged = pipeline
        .extract_document(file, model, config.read_timeout())
        .await
        .with_context(|| format!("Failed to extract {display}"))?;

    let output = match (format, no_metadata) {
        (ExportFormat::Json, false) => serde_json::to_string_pretty(&merged)?,
        (format, _) => render(&merged.without_metadata(), format).map_err(anyhow::Error::msg)?,
    };
    println!("{output}");
    Ok(())
}
