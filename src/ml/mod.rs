/// Statistical side of triage
///
/// This module provides:
/// - Turkish/English text normalization
/// - TF-IDF feature extraction over unigrams and bigrams
/// - Linear softmax clinic classification
/// - Artifact loading and fingerprinting
/// - An offline naive Bayes fit for producing artifacts

pub mod artifact;
pub mod classifier;
pub mod features;
pub mod models;
pub mod normalizer;
pub mod trainer;

pub use artifact::{fingerprint, ArtifactSet, ModelArtifact};
pub use classifier::{ClassifierArtifact, Classifier, ClinicClassifier, LinearSoftmaxModel};
pub use features::{FeatureVector, FeatureVectorizer, VectorizerArtifact};
pub use models::{FeatureConfig, ModelMetadata, ModelType, TrainingSample};
pub use normalizer::{NormalizedText, TextNormalizer};
pub use trainer::{read_corpus, ModelTrainer};
