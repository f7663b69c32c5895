//! Common test utilities for triage integration tests
//!
//! Fixtures load the artifacts shipped under `assets/` or fit a fresh model
//! from the shipped corpus into a temporary directory.

#![allow(dead_code)]

use clinic_triage::{
    config::{ArtifactsConfig, Config, FusionConfig, LlmConfig, ObservabilityConfig, ScoringConfig},
    ml::{read_corpus, ArtifactSet, ModelTrainer},
    models::ClinicCatalog,
    EngineSettings, TriageEngine,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub fn asset_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets").join(name)
}

pub fn shipped_paths() -> ArtifactsConfig {
    ArtifactsConfig {
        catalog_path: asset_path("catalog.toml"),
        model_path: asset_path("model.json"),
        rules_path: asset_path("rules.toml"),
    }
}

pub fn test_config(artifacts: ArtifactsConfig) -> Config {
    Config {
        artifacts,
        fusion: FusionConfig::default(),
        scoring: ScoringConfig::default(),
        llm: LlmConfig::default(),
        observability: ObservabilityConfig::default(),
    }
}

/// Engine over the shipped artifacts
pub fn shipped_engine() -> TriageEngine {
    let artifacts = ArtifactSet::load(&shipped_paths()).expect("shipped artifacts load");
    TriageEngine::new(artifacts, EngineSettings::default()).expect("engine builds")
}

/// Fit a model from the shipped corpus and write a full artifact set to a temp dir
pub fn trained_artifact_dir() -> (TempDir, ArtifactsConfig) {
    let dir = TempDir::new().expect("temp dir");

    let catalog_raw = std::fs::read_to_string(asset_path("catalog.toml")).unwrap();
    let rules_raw = std::fs::read_to_string(asset_path("rules.toml")).unwrap();
    let corpus_raw = std::fs::read_to_string(asset_path("corpus.jsonl")).unwrap();

    let catalog = Arc::new(ClinicCatalog::from_toml_str(&catalog_raw).unwrap());
    let samples = read_corpus(&corpus_raw).unwrap();
    let artifact = ModelTrainer::default()
        .fit(catalog, &samples, "fixture", "test")
        .unwrap();

    let paths = ArtifactsConfig {
        catalog_path: dir.path().join("catalog.toml"),
        model_path: dir.path().join("model.json"),
        rules_path: dir.path().join("rules.toml"),
    };
    std::fs::write(&paths.catalog_path, catalog_raw).unwrap();
    std::fs::write(&paths.rules_path, rules_raw).unwrap();
    artifact.save(&paths.model_path).unwrap();

    (dir, paths)
}

pub fn top_ids(recommendation: &clinic_triage::FusedRecommendation) -> Vec<String> {
    recommendation
        .clinics
        .iter()
        .map(|r| r.label.id.clone())
        .collect()
}
