use crate::error::Result;
use crate::fusion::FusionWeights;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Artifact file locations
    pub artifacts: ArtifactsConfig,

    /// Fusion weights and request defaults
    #[serde(default)]
    pub fusion: FusionConfig,

    /// Urgency scoring
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Optional LLM collaborator
    #[serde(default)]
    pub llm: LlmConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(|p| p.to_string_lossy().into_owned())
            .or_else(|| std::env::var("TRIAGE_CONFIG_PATH").ok());

        let mut builder = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ));

        // Override with config file if given
        if let Some(config_path) = config_path {
            builder = builder.add_source(config::File::with_name(&config_path).required(true));
        }

        // Override with environment variables (prefix: TRIAGE__)
        let config = builder
            .add_source(
                config::Environment::with_prefix("TRIAGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Clinic catalog (TOML)
    pub catalog_path: PathBuf,

    /// Vectorizer and classifier parameters (JSON)
    pub model_path: PathBuf,

    /// Symptom dictionary, combinations and overrides (TOML)
    pub rules_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default = "default_statistical_weight")]
    pub statistical_weight: f64,

    #[serde(default = "default_llm_weight")]
    pub llm_weight: f64,

    /// Clinics returned when the request does not say
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
}

impl FusionConfig {
    pub fn weights(&self) -> FusionWeights {
        FusionWeights::new(self.statistical_weight, self.llm_weight)
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            statistical_weight: default_statistical_weight(),
            llm_weight: default_llm_weight(),
            default_top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Extra score added per emergency finding
    #[serde(default = "default_emergency_increment")]
    pub emergency_increment: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            emergency_increment: default_emergency_increment(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Enable the LLM opinion
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Name of the env var holding the API key
    pub api_key_env: Option<String>,

    /// Upper bound on one LLM call (milliseconds)
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key_env: None,
            timeout_ms: default_llm_timeout_ms(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            metrics_enabled: default_true(),
        }
    }
}

// Default value functions
fn default_statistical_weight() -> f64 {
    0.6
}

fn default_llm_weight() -> f64 {
    0.4
}

fn default_top_k() -> usize {
    3
}

fn default_emergency_increment() -> f64 {
    3.0
}

fn default_llm_endpoint() -> String {
    "http://localhost:8000/v1".to_string()
}

fn default_llm_model() -> String {
    "triage-assistant".to_string()
}

fn default_llm_timeout_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
