use crate::error::{AppError, Result};
use crate::ml::features::FeatureVector;
use crate::ml::models::ModelType;
use crate::models::{ClinicCatalog, Prediction, RankedClinic};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trait for probabilistic classifiers over sparse features
pub trait Classifier: Send + Sync {
    /// Probability per class, in class-index order, summing to 1
    fn predict_proba(&self, features: &FeatureVector) -> Result<Array1<f64>>;

    /// Number of classes
    fn n_classes(&self) -> usize;

    /// Expected feature dimension
    fn n_features(&self) -> usize;

    /// Get model type
    fn model_type(&self) -> ModelType;
}

/// Serialized classifier parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub model_type: ModelType,

    /// Label ids, must match the catalog order exactly
    pub labels: Vec<String>,

    /// Coefficients (n_classes × n_features)
    pub coefficients: Array2<f64>,

    /// Intercepts (n_classes)
    pub intercepts: Array1<f64>,
}

/// Linear model with a softmax link: `p = softmax(W·x + b)`
#[derive(Debug, Clone)]
pub struct LinearSoftmaxModel {
    model_type: ModelType,
    coefficients: Array2<f64>,
    intercepts: Array1<f64>,
}

impl LinearSoftmaxModel {
    pub fn new(
        model_type: ModelType,
        coefficients: Array2<f64>,
        intercepts: Array1<f64>,
    ) -> Result<Self> {
        let (n_classes, n_features) = coefficients.dim();
        if n_classes == 0 || n_features == 0 {
            return Err(AppError::ModelUnavailable(format!(
                "classifier has degenerate shape {}x{}",
                n_classes, n_features
            )));
        }
        if intercepts.len() != n_classes {
            return Err(AppError::ModelUnavailable(format!(
                "classifier has {} classes but {} intercepts",
                n_classes,
                intercepts.len()
            )));
        }
        if coefficients.iter().chain(intercepts.iter()).any(|v| !v.is_finite()) {
            return Err(AppError::ModelUnavailable(
                "classifier parameters contain non-finite values".to_string(),
            ));
        }

        Ok(Self {
            model_type,
            coefficients,
            intercepts,
        })
    }

    /// Fit a multinomial naive Bayes model.
    ///
    /// Log-likelihoods use additive (Laplace) smoothing `alpha`; log-priors
    /// are add-one smoothed so classes without documents stay finite. An
    /// all-zero feature vector therefore predicts the smoothed class prior.
    pub fn fit_naive_bayes(
        n_classes: usize,
        vectors: &[FeatureVector],
        labels: &[usize],
        alpha: f64,
    ) -> Result<Self> {
        if vectors.is_empty() || vectors.len() != labels.len() {
            return Err(AppError::InvalidInput(format!(
                "need one label per vector (got {} vectors, {} labels)",
                vectors.len(),
                labels.len()
            )));
        }
        if !(alpha > 0.0) || !alpha.is_finite() {
            return Err(AppError::InvalidInput(format!(
                "smoothing alpha must be positive, got {}",
                alpha
            )));
        }

        let n_features = vectors[0].dimension();
        let mut feature_sums = Array2::<f64>::zeros((n_classes, n_features));
        let mut class_counts = vec![0usize; n_classes];

        for (vector, &label) in vectors.iter().zip(labels) {
            if label >= n_classes {
                return Err(AppError::InvalidInput(format!(
                    "label index {} out of range for {} classes",
                    label, n_classes
                )));
            }
            if vector.dimension() != n_features {
                return Err(AppError::InvalidInput(
                    "training vectors have inconsistent dimensions".to_string(),
                ));
            }
            class_counts[label] += 1;
            for &(j, value) in vector.entries() {
                feature_sums[[label, j]] += value;
            }
        }

        let mut coefficients = Array2::<f64>::zeros((n_classes, n_features));
        for c in 0..n_classes {
            let total = feature_sums.row(c).sum() + alpha * n_features as f64;
            for j in 0..n_features {
                coefficients[[c, j]] = ((feature_sums[[c, j]] + alpha) / total).ln();
            }
        }

        let n_docs = vectors.len() as f64;
        let intercepts = Array1::from_iter(
            class_counts
                .iter()
                .map(|&count| ((count as f64 + 1.0) / (n_docs + n_classes as f64)).ln()),
        );

        Self::new(ModelType::MultinomialNaiveBayes, coefficients, intercepts)
    }

    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    pub fn intercepts(&self) -> &Array1<f64> {
        &self.intercepts
    }
}

impl Classifier for LinearSoftmaxModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Array1<f64>> {
        if features.dimension() != self.n_features() {
            return Err(AppError::ModelUnavailable(format!(
                "feature dimension {} does not match classifier dimension {}",
                features.dimension(),
                self.n_features()
            )));
        }

        let mut logits = self.intercepts.clone();
        for &(j, value) in features.entries() {
            logits.scaled_add(value, &self.coefficients.column(j));
        }

        // Numerically stable softmax
        let max = logits.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        logits.mapv_inplace(|v| (v - max).exp());
        let sum = logits.sum();
        logits.mapv_inplace(|v| v / sum);

        Ok(logits)
    }

    fn n_classes(&self) -> usize {
        self.coefficients.nrows()
    }

    fn n_features(&self) -> usize {
        self.coefficients.ncols()
    }

    fn model_type(&self) -> ModelType {
        self.model_type
    }
}

/// Clinic classifier: a probabilistic model bound to the clinic catalog
pub struct ClinicClassifier {
    catalog: Arc<ClinicCatalog>,

    model: LinearSoftmaxModel,
}

impl ClinicClassifier {
    /// Bind a model to the catalog; class i of the model is catalog entry i
    pub fn new(catalog: Arc<ClinicCatalog>, model: LinearSoftmaxModel) -> Result<Self> {
        if model.n_classes() != catalog.len() {
            return Err(AppError::ModelUnavailable(format!(
                "classifier predicts {} classes but the catalog has {}",
                model.n_classes(),
                catalog.len()
            )));
        }
        Ok(Self { catalog, model })
    }

    /// Rebuild from a serialized artifact, checking labels against the catalog
    pub fn from_artifact(catalog: Arc<ClinicCatalog>, artifact: ClassifierArtifact) -> Result<Self> {
        let expected: Vec<&str> = catalog.labels().iter().map(|l| l.id.as_str()).collect();
        let actual: Vec<&str> = artifact.labels.iter().map(String::as_str).collect();
        if expected != actual {
            return Err(AppError::ModelUnavailable(format!(
                "classifier labels {:?} do not match catalog {:?}",
                actual, expected
            )));
        }

        let model = LinearSoftmaxModel::new(
            artifact.model_type,
            artifact.coefficients,
            artifact.intercepts,
        )?;
        Self::new(catalog, model)
    }

    pub fn to_artifact(&self) -> ClassifierArtifact {
        ClassifierArtifact {
            model_type: self.model.model_type(),
            labels: self.catalog.labels().iter().map(|l| l.id.clone()).collect(),
            coefficients: self.model.coefficients().clone(),
            intercepts: self.model.intercepts().clone(),
        }
    }

    /// Full distribution over the catalog, ranked, ties in catalog order
    pub fn distribution(&self, vector: &FeatureVector) -> Result<Prediction> {
        let proba = self.model.predict_proba(vector)?;
        let entries = self
            .catalog
            .labels()
            .iter()
            .zip(proba.iter())
            .map(|(label, &p)| RankedClinic::new(label.clone(), p))
            .collect();
        Ok(Prediction::from_unsorted(entries))
    }

    /// Top `top_k` clinics for a feature vector
    pub fn predict(&self, vector: &FeatureVector, top_k: usize) -> Result<Prediction> {
        self.validate_top_k(top_k)?;
        Ok(self.distribution(vector)?.truncated(top_k))
    }

    pub fn validate_top_k(&self, top_k: usize) -> Result<()> {
        if top_k == 0 || top_k > self.catalog.len() {
            return Err(AppError::InvalidInput(format!(
                "top_k must be between 1 and {}, got {}",
                self.catalog.len(),
                top_k
            )));
        }
        Ok(())
    }

    pub fn catalog(&self) -> &Arc<ClinicCatalog> {
        &self.catalog
    }

    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }

    pub fn model_type(&self) -> ModelType {
        self.model.model_type()
    }
}
