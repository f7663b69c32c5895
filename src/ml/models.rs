use serde::{Deserialize, Serialize};

/// Feature extraction configuration, fixed at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Maximum vocabulary size for text features
    pub max_vocab_size: usize,

    /// Minimum number of documents a term must appear in
    pub min_doc_freq: usize,

    /// Maximum share of documents a term may appear in (0.0 - 1.0)
    pub max_doc_freq_ratio: f64,

    /// N-gram range (min, max)
    pub ngram_range: (usize, usize),

    /// Weight term frequencies by inverse document frequency
    pub use_idf: bool,

    /// Scale each vector to unit L2 norm
    pub l2_normalize: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_vocab_size: 5000,
            min_doc_freq: 1,
            max_doc_freq_ratio: 1.0,
            ngram_range: (1, 2), // Unigrams and bigrams
            use_idf: true,
            l2_normalize: true,
        }
    }
}

/// One labeled document of a training corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Raw symptom text
    pub text: String,

    /// Clinic label id
    pub label: String,
}

impl TrainingSample {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Multinomial naive Bayes expressed as linear log-probabilities
    MultinomialNaiveBayes,

    /// Multinomial logistic regression fitted offline
    LogisticRegression,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::MultinomialNaiveBayes => write!(f, "Multinomial Naive Bayes"),
            ModelType::LogisticRegression => write!(f, "Logistic Regression"),
        }
    }
}

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Model version
    pub version: String,

    /// Model type
    pub model_type: ModelType,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training documents
    pub n_training_samples: usize,

    /// Number of features (vocabulary size)
    pub n_features: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_config_default() {
        let config = FeatureConfig::default();
        assert_eq!(config.ngram_range, (1, 2));
        assert!(config.use_idf);
        assert!(config.l2_normalize);
    }

    #[test]
    fn test_model_type_display() {
        assert_eq!(
            ModelType::MultinomialNaiveBayes.to_string(),
            "Multinomial Naive Bayes"
        );
        assert_eq!(ModelType::LogisticRegression.to_string(), "Logistic Regression");
    }

    #[test]
    fn test_training_sample_serde() {
        let sample: TrainingSample =
            serde_json::from_str(r#"{"text":"başım ağrıyor","label":"noroloji"}"#).unwrap();
        assert_eq!(sample, TrainingSample::new("başım ağrıyor", "noroloji"));
    }
}
