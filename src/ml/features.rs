use crate::error::{AppError, Result};
use crate::ml::models::FeatureConfig;
use crate::ml::normalizer::NormalizedText;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Sparse feature vector: (vocabulary index, weight) pairs sorted by index
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    dimension: usize,
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// All-zero vector of the given dimension
    pub fn zeros(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    /// Build from arbitrary entries. Out-of-range indices and zeros are dropped,
    /// repeated indices are summed.
    pub fn from_entries(dimension: usize, entries: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for (idx, value) in entries {
            if idx < dimension {
                *merged.entry(idx).or_insert(0.0) += value;
            }
        }
        Self {
            dimension,
            entries: merged.into_iter().filter(|(_, v)| *v != 0.0).collect(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn l2_norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }
}

/// Serialized form of a fitted vectorizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub config: FeatureConfig,

    /// Vocabulary terms; position is the feature index
    pub terms: Vec<String>,

    /// IDF weight per term, same order as `terms`
    pub idf: Vec<f64>,
}

/// TF-IDF vectorizer over unigram/bigram terms.
///
/// Read-only after fitting or loading: unknown terms are ignored and the
/// vocabulary never grows at inference time.
#[derive(Debug, Clone)]
pub struct FeatureVectorizer {
    /// Configuration
    config: FeatureConfig,

    /// Vocabulary mapping (term -> index)
    vocabulary: HashMap<String, usize>,

    /// Terms by index
    terms: Vec<String>,

    /// Inverse document frequency by index
    idf: Vec<f64>,
}

impl FeatureVectorizer {
    /// Learn vocabulary and IDF weights from a normalized corpus
    pub fn fit(config: FeatureConfig, corpus: &[NormalizedText]) -> Result<Self> {
        validate_ngram_range(config.ngram_range)?;
        if corpus.is_empty() {
            return Err(AppError::InvalidInput(
                "cannot fit a vectorizer on an empty corpus".to_string(),
            ));
        }

        // Document frequency per term
        let mut term_doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let unique_terms: HashSet<String> =
                extract_terms(config.ngram_range, doc).into_iter().collect();
            for term in unique_terms {
                *term_doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        // Filter vocabulary by document frequency
        let n_docs = corpus.len();
        let max_df = (config.max_doc_freq_ratio * n_docs as f64).floor() as usize;
        let mut vocab_list: Vec<(String, usize)> = term_doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= config.min_doc_freq && *df <= max_df.max(1))
            .collect();

        // Most frequent first, then alphabetical so the cap is deterministic
        vocab_list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        vocab_list.truncate(config.max_vocab_size);

        if vocab_list.is_empty() {
            return Err(AppError::InvalidInput(
                "no terms survived the document-frequency thresholds".to_string(),
            ));
        }

        let idf: Vec<f64> = vocab_list
            .iter()
            .map(|(_, df)| {
                if config.use_idf {
                    ((1.0 + n_docs as f64) / (1.0 + *df as f64)).ln() + 1.0
                } else {
                    1.0
                }
            })
            .collect();
        let terms: Vec<String> = vocab_list.into_iter().map(|(term, _)| term).collect();

        Ok(Self::assemble(config, terms, idf))
    }

    /// Rebuild a vectorizer from its serialized artifact
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self> {
        validate_ngram_range(artifact.config.ngram_range)
            .map_err(|e| AppError::ModelUnavailable(e.to_string()))?;

        if artifact.terms.len() != artifact.idf.len() {
            return Err(AppError::ModelUnavailable(format!(
                "vectorizer has {} terms but {} idf weights",
                artifact.terms.len(),
                artifact.idf.len()
            )));
        }
        if artifact.terms.is_empty() {
            return Err(AppError::ModelUnavailable(
                "vectorizer vocabulary is empty".to_string(),
            ));
        }
        if let Some(bad) = artifact.idf.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(AppError::ModelUnavailable(format!(
                "vectorizer has an invalid idf weight {}",
                bad
            )));
        }

        let unique: HashSet<&String> = artifact.terms.iter().collect();
        if unique.len() != artifact.terms.len() {
            return Err(AppError::ModelUnavailable(
                "vectorizer vocabulary contains duplicate terms".to_string(),
            ));
        }

        Ok(Self::assemble(artifact.config, artifact.terms, artifact.idf))
    }

    fn assemble(config: FeatureConfig, terms: Vec<String>, idf: Vec<f64>) -> Self {
        let vocabulary = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        Self {
            config,
            vocabulary,
            terms,
            idf,
        }
    }

    /// Serialize the fitted state
    pub fn to_artifact(&self) -> VectorizerArtifact {
        VectorizerArtifact {
            config: self.config.clone(),
            terms: self.terms.clone(),
            idf: self.idf.clone(),
        }
    }

    /// Turn normalized tokens into a sparse TF-IDF vector
    pub fn vectorize(&self, tokens: &NormalizedText) -> FeatureVector {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for term in extract_terms(self.config.ngram_range, tokens) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf as f64 * self.idf[idx]))
            .collect();

        if self.config.l2_normalize {
            let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, value) in entries.iter_mut() {
                    *value /= norm;
                }
            }
        }

        FeatureVector {
            dimension: self.terms.len(),
            entries,
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Get vocabulary size (the feature dimension)
    pub fn dimension(&self) -> usize {
        self.terms.len()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, index: usize) -> Option<f64> {
        self.idf.get(index).copied()
    }
}

fn validate_ngram_range(range: (usize, usize)) -> Result<()> {
    if range.0 == 0 || range.0 > range.1 {
        return Err(AppError::InvalidInput(format!(
            "invalid n-gram range ({}, {})",
            range.0, range.1
        )));
    }
    Ok(())
}

/// Generate n-gram terms; multi-word terms are joined with `_`
fn extract_terms(ngram_range: (usize, usize), tokens: &NormalizedText) -> Vec<String> {
    let words = tokens.tokens();
    let mut terms = Vec::new();

    for n in ngram_range.0..=ngram_range.1 {
        for window in words.windows(n) {
            terms.push(window.join("_"));
        }
    }

    terms
}
