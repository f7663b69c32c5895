use crate::error::{AppError, Result};
use crate::ml::artifact::ModelArtifact;
use crate::ml::classifier::{ClinicClassifier, LinearSoftmaxModel};
use crate::ml::features::FeatureVectorizer;
use crate::ml::models::{FeatureConfig, ModelMetadata, TrainingSample};
use crate::ml::normalizer::{NormalizedText, TextNormalizer};
use crate::models::ClinicCatalog;
use std::sync::Arc;
use tracing::info;

/// Default Laplace smoothing for naive Bayes
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Offline helper that fits a model artifact from a labeled corpus
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    feature_config: FeatureConfig,
    alpha: f64,
    normalizer: TextNormalizer,
}

impl ModelTrainer {
    pub fn new(feature_config: FeatureConfig) -> Self {
        Self {
            feature_config,
            alpha: DEFAULT_ALPHA,
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Fit the vocabulary and a multinomial naive Bayes model
    pub fn fit(
        &self,
        catalog: Arc<ClinicCatalog>,
        samples: &[TrainingSample],
        name: &str,
        version: &str,
    ) -> Result<ModelArtifact> {
        if samples.is_empty() {
            return Err(AppError::InvalidInput("training corpus is empty".to_string()));
        }

        let labels = samples
            .iter()
            .map(|s| {
                catalog.position(&s.label).ok_or_else(|| {
                    AppError::InvalidInput(format!("unknown clinic label '{}'", s.label))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let corpus: Vec<NormalizedText> = samples
            .iter()
            .map(|s| self.normalizer.normalize(&s.text))
            .collect();

        let vectorizer = FeatureVectorizer::fit(self.feature_config.clone(), &corpus)?;
        let vectors: Vec<_> = corpus.iter().map(|t| vectorizer.vectorize(t)).collect();

        let model =
            LinearSoftmaxModel::fit_naive_bayes(catalog.len(), &vectors, &labels, self.alpha)?;
        let classifier = ClinicClassifier::new(catalog, model)?;

        let metadata = ModelMetadata {
            name: name.to_string(),
            version: version.to_string(),
            model_type: classifier.model_type(),
            trained_at: chrono::Utc::now(),
            n_training_samples: samples.len(),
            n_features: vectorizer.dimension(),
        };

        info!(
            samples = samples.len(),
            features = vectorizer.dimension(),
            "✅ Model training completed"
        );

        Ok(ModelArtifact {
            metadata,
            vectorizer: vectorizer.to_artifact(),
            classifier: classifier.to_artifact(),
        })
    }
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

/// Parse a JSON-lines corpus of `{"text": .., "label": ..}` records.
/// Blank lines are skipped.
pub fn read_corpus(raw: &str) -> Result<Vec<TrainingSample>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                AppError::InvalidInput(format!("corpus line {}: {}", i + 1, e))
            })
        })
        .collect()
}
