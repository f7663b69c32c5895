use crate::config::ArtifactsConfig;
use crate::error::{AppError, Result};
use crate::fusion::OverrideTable;
use crate::ml::classifier::{ClassifierArtifact, ClinicClassifier};
use crate::ml::features::{FeatureVectorizer, VectorizerArtifact};
use crate::ml::models::ModelMetadata;
use crate::ml::normalizer::TextNormalizer;
use crate::models::ClinicCatalog;
use crate::rules::{RuleDictionary, RulesFile};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Contents of `model.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ModelMetadata,
    pub vectorizer: VectorizerArtifact,
    pub classifier: ClassifierArtifact,
}

impl ModelArtifact {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| AppError::ModelUnavailable(format!("invalid model artifact: {}", e)))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the artifact as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// Hex SHA-256 of artifact bytes
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Every artifact the engine needs, cross-validated.
///
/// Built in one step; a failure anywhere leaves nothing behind.
pub struct ArtifactSet {
    pub catalog: Arc<ClinicCatalog>,
    pub vectorizer: Arc<FeatureVectorizer>,
    pub classifier: Arc<ClinicClassifier>,
    pub dictionary: Arc<RuleDictionary>,
    pub overrides: Arc<OverrideTable>,
    pub metadata: ModelMetadata,
    pub fingerprint: String,
}

impl ArtifactSet {
    /// Read and validate the artifact files named in the configuration
    pub fn load(paths: &ArtifactsConfig) -> Result<Self> {
        let result = Self::load_inner(paths);
        match &result {
            Ok(set) => info!(
                model = %set.metadata.name,
                version = %set.metadata.version,
                clinics = set.catalog.len(),
                features = set.vectorizer.dimension(),
                rules = set.dictionary.len(),
                fingerprint = %set.fingerprint,
                "Artifacts loaded"
            ),
            Err(e) => error!("Failed to load artifacts: {}", e),
        }
        result
    }

    fn load_inner(paths: &ArtifactsConfig) -> Result<Self> {
        let catalog_raw = read_text(&paths.catalog_path)?;
        let model_raw = read_bytes(&paths.model_path)?;
        let rules_raw = read_text(&paths.rules_path)?;

        Self::from_parts(&catalog_raw, &model_raw, &rules_raw)
    }

    /// Build from in-memory artifact contents
    pub fn from_parts(catalog_toml: &str, model_json: &[u8], rules_toml: &str) -> Result<Self> {
        let catalog = Arc::new(ClinicCatalog::from_toml_str(catalog_toml)?);
        let model = ModelArtifact::from_json_slice(model_json)?;
        let rules = RulesFile::from_toml_str(rules_toml)?;

        let vectorizer = FeatureVectorizer::from_artifact(model.vectorizer)?;
        let classifier = ClinicClassifier::from_artifact(catalog.clone(), model.classifier)?;
        if classifier.n_features() != vectorizer.dimension() {
            return Err(AppError::ModelUnavailable(format!(
                "classifier expects {} features but the vocabulary has {}",
                classifier.n_features(),
                vectorizer.dimension()
            )));
        }

        let dictionary = RuleDictionary::compile(&rules, &TextNormalizer::new())?;
        let overrides = OverrideTable::new(rules.overrides, &catalog)?;

        Ok(Self {
            catalog,
            vectorizer: Arc::new(vectorizer),
            classifier: Arc::new(classifier),
            dictionary: Arc::new(dictionary),
            overrides: Arc::new(overrides),
            metadata: model.metadata,
            fingerprint: fingerprint(model_json),
        })
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        AppError::ModelUnavailable(format!("cannot read {}: {}", path.display(), e))
    })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        AppError::ModelUnavailable(format!("cannot read {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let hash = fingerprint(b"");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_missing_files_are_model_unavailable() {
        let paths = ArtifactsConfig {
            catalog_path: "/nonexistent/catalog.toml".into(),
            model_path: "/nonexistent/model.json".into(),
            rules_path: "/nonexistent/rules.toml".into(),
        };
        assert!(matches!(
            ArtifactSet::load(&paths),
            Err(AppError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_corrupt_model_rejected() {
        let catalog = "[[clinics]]\nid = \"noroloji\"\nname = \"Nöroloji\"\n";
        let result = ArtifactSet::from_parts(catalog, b"{not json", "");
        assert!(matches!(result, Err(AppError::ModelUnavailable(_))));
    }
}
