use crate::config::Config;
use crate::engine::request::{check_text, AssessRequest};
use crate::error::{AppError, Result};
use crate::fusion::{FusionWeights, ResultFusion};
use crate::llm::ExternalPredictor;
use crate::metrics::{
    ASSESSMENTS_TOTAL, ASSESSMENT_DURATION_SECONDS, DEGENERATE_INPUTS_TOTAL,
    EMERGENCY_OVERRIDES_TOTAL, LLM_OUTCOMES_TOTAL,
};
use crate::ml::{ArtifactSet, ClinicClassifier, FeatureVectorizer, NormalizedText, TextNormalizer};
use crate::models::{
    AssessmentWarning, ClinicCatalog, FusedRecommendation, LlmStatus, Prediction, PredictorOutput,
    SymptomFinding, UrgencyAssessment,
};
use crate::rules::SymptomRuleEngine;
use crate::scoring::{self, EmergencyScorer, ImageAnalyzer};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use validator::Validate;

/// Tunables taken from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub weights: FusionWeights,
    pub emergency_increment: f64,
    pub llm_timeout: Duration,
    pub default_top_k: usize,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            weights: config.fusion.weights(),
            emergency_increment: config.scoring.emergency_increment,
            llm_timeout: Duration::from_millis(config.llm.timeout_ms),
            default_top_k: config.fusion.default_top_k,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            emergency_increment: scoring::DEFAULT_EMERGENCY_INCREMENT,
            llm_timeout: Duration::from_millis(2000),
            default_top_k: 3,
        }
    }
}

/// Per-request intermediate results before fusion
struct Analysis {
    tokens: NormalizedText,
    statistical: Prediction,
    findings: Vec<SymptomFinding>,
}

/// The full triage pipeline over one immutable artifact set
pub struct TriageEngine {
    normalizer: TextNormalizer,
    vectorizer: Arc<FeatureVectorizer>,
    classifier: Arc<ClinicClassifier>,
    rules: SymptomRuleEngine,
    scorer: EmergencyScorer,
    fusion: ResultFusion,
    predictor: Option<Arc<dyn ExternalPredictor>>,
    settings: EngineSettings,
    model_version: String,
    fingerprint: String,
}

impl TriageEngine {
    pub fn new(artifacts: ArtifactSet, settings: EngineSettings) -> Result<Self> {
        settings.weights.normalized()?;
        artifacts.classifier.validate_top_k(settings.default_top_k)?;
        let scorer = EmergencyScorer::new(settings.emergency_increment)?;

        Ok(Self {
            normalizer: TextNormalizer::new(),
            vectorizer: artifacts.vectorizer,
            rules: SymptomRuleEngine::new(artifacts.dictionary),
            scorer,
            fusion: ResultFusion::new(artifacts.catalog, artifacts.overrides, scorer),
            classifier: artifacts.classifier,
            predictor: None,
            settings,
            model_version: format!("{}@{}", artifacts.metadata.name, artifacts.metadata.version),
            fingerprint: artifacts.fingerprint,
        })
    }

    pub fn with_external_predictor(mut self, predictor: Arc<dyn ExternalPredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn catalog(&self) -> &Arc<ClinicCatalog> {
        self.classifier.catalog()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn has_external_predictor(&self) -> bool {
        self.predictor.is_some()
    }

    /// Assess a request, consulting the LLM when asked to.
    ///
    /// LLM timeouts and failures never fail the request; the result falls
    /// back to statistical-only and says so in its provenance and warnings.
    pub async fn assess(&self, request: &AssessRequest) -> Result<FusedRecommendation> {
        request.validate()?;
        let top_k = request.top_k.unwrap_or(self.settings.default_top_k);
        self.classifier.validate_top_k(top_k)?;

        let started = Instant::now();
        let analysis = self.analyze(&request.text)?;

        let (external, llm_status) = if request.use_llm {
            self.consult_llm(&request.text).await
        } else {
            (None, LlmStatus::NotRequested)
        };

        self.finish(analysis, external, llm_status, top_k, started)
    }

    /// Statistical and rule-based assessment without the LLM
    pub fn assess_sync(&self, text: &str, top_k: usize) -> Result<FusedRecommendation> {
        check_text(text)?;
        self.classifier.validate_top_k(top_k)?;
        let started = Instant::now();
        let analysis = self.analyze(text)?;
        self.finish(analysis, None, LlmStatus::NotRequested, top_k, started)
    }

    /// Assess many texts in parallel. Results keep input order.
    pub fn assess_batch(&self, texts: &[String], top_k: usize) -> Vec<Result<FusedRecommendation>> {
        texts
            .par_iter()
            .map(|text| self.assess_sync(text, top_k))
            .collect()
    }

    /// Urgency from the rule engine alone; the classifier is not consulted
    pub fn screen(&self, text: &str) -> UrgencyAssessment {
        self.scorer.score(&self.rules.extract(text))
    }

    /// Score findings from the imaging collaborator
    pub async fn score_image(
        &self,
        analyzer: &dyn ImageAnalyzer,
        image: &[u8],
    ) -> Result<(Vec<SymptomFinding>, UrgencyAssessment)> {
        scoring::score_image(analyzer, &self.scorer, image).await
    }

    fn analyze(&self, text: &str) -> Result<Analysis> {
        let tokens = self.normalizer.normalize(text);
        let vector = self.vectorizer.vectorize(&tokens);
        let statistical = self.classifier.distribution(&vector)?;
        let findings = self.rules.extract_normalized(&tokens);

        debug!(
            tokens = tokens.len(),
            nnz = vector.nnz(),
            findings = findings.len(),
            "Analyzed input"
        );

        Ok(Analysis {
            tokens,
            statistical,
            findings,
        })
    }

    async fn consult_llm(&self, text: &str) -> (Option<Prediction>, LlmStatus) {
        let Some(predictor) = &self.predictor else {
            warn!("LLM opinion requested but no external predictor is configured");
            return (None, LlmStatus::NotConfigured);
        };

        let timeout = self.settings.llm_timeout;
        match tokio::time::timeout(timeout, predictor.predict(text, self.catalog())).await {
            Ok(Ok(prediction)) => (Some(prediction), LlmStatus::Used),
            Ok(Err(e)) => {
                warn!(predictor = predictor.name(), "LLM opinion failed: {}", e);
                (None, LlmStatus::Failed)
            }
            Err(_) => {
                let err = AppError::ExternalPredictorTimeout(timeout.as_millis() as u64);
                warn!(predictor = predictor.name(), "{}", err);
                (None, LlmStatus::TimedOut)
            }
        }
    }

    fn finish(
        &self,
        analysis: Analysis,
        external: Option<Prediction>,
        llm_status: LlmStatus,
        top_k: usize,
        started: Instant,
    ) -> Result<FusedRecommendation> {
        let degenerate = analysis.tokens.is_empty();

        let mut outputs = vec![
            PredictorOutput::Statistical(analysis.statistical),
            PredictorOutput::RuleBased(analysis.findings),
        ];
        if let Some(prediction) = external {
            outputs.push(PredictorOutput::External(prediction));
        }

        let mut recommendation = self.fusion.fuse(&outputs, &self.settings.weights)?;
        recommendation.clinics.truncate(top_k);
        recommendation.provenance.llm_status = llm_status;
        recommendation.provenance.model_version = Some(self.model_version.clone());
        recommendation.provenance.model_fingerprint = Some(self.fingerprint.clone());

        if degenerate {
            warn!(
                assessment_id = %recommendation.assessment_id,
                "Input has no usable tokens; ranking falls back to the prior"
            );
            DEGENERATE_INPUTS_TOTAL.inc();
            recommendation = recommendation.with_warning(AssessmentWarning::DegenerateInput);
        }
        if llm_status.is_degraded() {
            recommendation =
                recommendation.with_warning(AssessmentWarning::ExternalPredictorDegraded);
        }

        let mode = if llm_status == LlmStatus::Used {
            "fused"
        } else {
            "statistical"
        };
        let tier = recommendation.urgency.tier.to_string();
        ASSESSMENTS_TOTAL.with_label_values(&[tier.as_str(), mode]).inc();
        ASSESSMENT_DURATION_SECONDS
            .with_label_values(&[mode])
            .observe(started.elapsed().as_secs_f64());
        if llm_status != LlmStatus::NotRequested {
            LLM_OUTCOMES_TOTAL
                .with_label_values(&[llm_status.to_string().as_str()])
                .inc();
        }
        if let Some(forced) = &recommendation.provenance.emergency_override {
            EMERGENCY_OVERRIDES_TOTAL
                .with_label_values(&[forced.category.as_str()])
                .inc();
        }

        info!(
            assessment_id = %recommendation.assessment_id,
            tier = %tier,
            top_label = recommendation.top().map(|r| r.label.id.as_str()).unwrap_or("-"),
            llm_status = %llm_status,
            "Assessment completed"
        );

        Ok(recommendation)
    }
}
