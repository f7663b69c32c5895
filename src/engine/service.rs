use crate::config::Config;
use crate::engine::request::AssessRequest;
use crate::engine::triage::{EngineSettings, TriageEngine};
use crate::error::{AppError, Result};
use crate::llm::{ChatCompletionPredictor, ExternalPredictor};
use crate::ml::ArtifactSet;
use crate::models::FusedRecommendation;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Lifecycle owner for the triage engine.
///
/// Requests are rejected with `ModelUnavailable` until `start` has loaded
/// every artifact; the engine becomes visible in one swap. Concurrent `start`
/// calls are serialized and only the first one loads.
pub struct TriageService {
    /// Configuration
    config: Config,

    /// Loaded engine, `None` until started
    engine: RwLock<Option<Arc<TriageEngine>>>,

    /// Held for the whole of `start`
    start_lock: Mutex<()>,

    /// Externally supplied LLM predictor, takes precedence over configuration
    predictor: Option<Arc<dyn ExternalPredictor>>,
}

impl TriageService {
    /// Create a new triage service
    pub fn new(config: Config) -> Self {
        Self {
            config,
            engine: RwLock::new(None),
            start_lock: Mutex::new(()),
            predictor: None,
        }
    }

    pub fn with_external_predictor(mut self, predictor: Arc<dyn ExternalPredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Load artifacts and start serving
    pub async fn start(&self) -> Result<()> {
        let _starting = self.start_lock.lock().await;
        if self.is_running() {
            return Err(AppError::Configuration(
                "triage service already running".to_string(),
            ));
        }

        info!("🚀 Starting triage service");

        let paths = self.config.artifacts.clone();
        let artifacts = tokio::task::spawn_blocking(move || ArtifactSet::load(&paths))
            .await
            .map_err(|e| AppError::ModelUnavailable(format!("artifact loader panicked: {}", e)))??;

        let mut engine = TriageEngine::new(artifacts, EngineSettings::from_config(&self.config))
            .map_err(|e| {
                error!("Failed to build triage engine: {}", e);
                e
            })?;

        if let Some(predictor) = self.external_predictor()? {
            info!(predictor = predictor.name(), "LLM opinion enabled");
            engine = engine.with_external_predictor(predictor);
        }

        *self.engine.write() = Some(Arc::new(engine));
        info!("✅ Triage service ready");

        Ok(())
    }

    /// Stop serving and drop the loaded engine
    pub fn stop(&self) {
        *self.engine.write() = None;
        info!("🛑 Stopping triage service");
    }

    /// Check if service is running
    pub fn is_running(&self) -> bool {
        self.engine.read().is_some()
    }

    /// Current engine, or `ModelUnavailable` before the load completed
    pub fn engine(&self) -> Result<Arc<TriageEngine>> {
        self.engine
            .read()
            .clone()
            .ok_or_else(|| AppError::ModelUnavailable("artifacts are not loaded".to_string()))
    }

    /// Assess a request against the loaded engine
    pub async fn assess(&self, request: &AssessRequest) -> Result<FusedRecommendation> {
        let engine = self.engine()?;
        engine.assess(request).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn external_predictor(&self) -> Result<Option<Arc<dyn ExternalPredictor>>> {
        if let Some(predictor) = &self.predictor {
            return Ok(Some(predictor.clone()));
        }
        if !self.config.llm.enabled {
            return Ok(None);
        }
        let predictor = ChatCompletionPredictor::from_config(&self.config.llm)?;
        Ok(Some(Arc::new(predictor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArtifactsConfig, FusionConfig, LlmConfig, ObservabilityConfig, ScoringConfig};
    use std::path::PathBuf;

    fn config() -> Config {
        let assets = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets");
        Config {
            artifacts: ArtifactsConfig {
                catalog_path: assets.join("catalog.toml"),
                model_path: assets.join("model.json"),
                rules_path: assets.join("rules.toml"),
            },
            fusion: FusionConfig::default(),
            scoring: ScoringConfig::default(),
            llm: LlmConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_concurrent_start_loads_once() {
        let service = TriageService::new(config());

        let (first, second) = tokio::join!(service.start(), service.start());

        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );
        assert!(service.is_running());
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let service = TriageService::new(config());
        service.start().await.unwrap();

        assert!(matches!(
            service.start().await,
            Err(AppError::Configuration(_))
        ));
    }
}
