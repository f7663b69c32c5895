use anyhow::Context;
use clap::{Parser, Subcommand};
use clinic_triage::{
    config::{Config, ObservabilityConfig},
    metrics,
    ml::{read_corpus, FeatureConfig, ModelTrainer},
    models::ClinicCatalog,
    AssessRequest, TriageService,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic-triage")]
#[command(about = "Route patient complaints to a clinic and score their urgency", version)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "TRIAGE_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Print Prometheus metrics to stderr when done
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a single complaint
    Assess {
        #[arg(short, long)]
        text: String,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Blend in the LLM opinion
        #[arg(long)]
        llm: bool,
    },

    /// Assess one complaint per line, writing JSON lines
    Batch {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Urgency from the symptom rules only
    Screen {
        #[arg(short, long)]
        text: String,
    },

    /// List the clinic catalog
    Catalog,

    /// Fit a model artifact from a labeled JSON-lines corpus
    Train {
        #[arg(long)]
        corpus: PathBuf,

        #[arg(short, long)]
        out: PathBuf,

        /// Catalog to train against (defaults to the configured one)
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[arg(long, default_value = "clinic-triage-nb")]
        name: String,

        #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
        model_version: String,

        /// Laplace smoothing
        #[arg(long, default_value_t = 1.0)]
        alpha: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.observability);
    tracing::debug!("Starting clinic-triage v{}", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Err(e) = metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
        }
    }

    match cli.command {
        Commands::Assess { text, top_k, llm } => {
            let service = start_service(config).await?;
            let mut request = AssessRequest::new(text);
            if let Some(k) = top_k {
                request = request.with_top_k(k);
            }
            if llm {
                request = request.with_llm();
            }
            let recommendation = service.assess(&request).await?;
            println!("{}", serde_json::to_string_pretty(&recommendation)?);
        }

        Commands::Batch { input, top_k } => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let texts: Vec<String> = raw
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect();

            let top_k = top_k.unwrap_or(config.fusion.default_top_k);
            let service = start_service(config).await?;
            let engine = service.engine()?;

            for (text, result) in texts.iter().zip(engine.assess_batch(&texts, top_k)) {
                match result {
                    Ok(recommendation) => println!("{}", serde_json::to_string(&recommendation)?),
                    Err(e) => {
                        tracing::error!("Assessment failed for {:?}: {}", text, e);
                        println!(
                            "{}",
                            serde_json::json!({ "text": text, "error": e.to_string(), "code": e.error_code() })
                        );
                    }
                }
            }
        }

        Commands::Screen { text } => {
            let service = start_service(config).await?;
            let assessment = service.engine()?.screen(&text);
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }

        Commands::Catalog => {
            let catalog = load_catalog(&config.artifacts.catalog_path)?;
            for label in catalog.labels() {
                println!("{}\t{}", label.id, label.name);
            }
        }

        Commands::Train {
            corpus,
            out,
            catalog,
            name,
            model_version,
            alpha,
        } => {
            let catalog_path = catalog.unwrap_or_else(|| config.artifacts.catalog_path.clone());
            let catalog = Arc::new(load_catalog(&catalog_path)?);

            let raw = std::fs::read_to_string(&corpus)
                .with_context(|| format!("Failed to read {}", corpus.display()))?;
            let samples = read_corpus(&raw)?;

            let artifact = ModelTrainer::new(FeatureConfig::default())
                .with_alpha(alpha)
                .fit(catalog, &samples, &name, &model_version)?;
            artifact.save(&out)?;

            tracing::info!(
                out = %out.display(),
                features = artifact.metadata.n_features,
                samples = artifact.metadata.n_training_samples,
                "Model artifact written"
            );
        }
    }

    if cli.metrics {
        eprintln!("{}", metrics::gather_metrics());
    }

    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("clinic_triage={}", observability.log_level).into()
    });

    // stdout carries JSON results only
    if observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn start_service(config: Config) -> anyhow::Result<TriageService> {
    let service = TriageService::new(config);
    service.start().await.context("Failed to load triage artifacts")?;
    Ok(service)
}

fn load_catalog(path: &std::path::Path) -> anyhow::Result<ClinicCatalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ClinicCatalog::from_toml_str(&raw)?)
}
