//! Criterion benchmarks for the triage pipeline
//!
//! These benchmarks measure:
//! - Text normalization
//! - Single assessment (statistical + rules)
//! - Batch assessment throughput

use clinic_triage::{
    ml::{ArtifactSet, TextNormalizer},
    config::ArtifactsConfig,
    EngineSettings, TriageEngine,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::path::PathBuf;

const TEXTS: &[&str] = &[
    "Baş ağrım var ve mide bulantısı yaşıyorum",
    "I have chest pain and cold sweating",
    "Öksürük ve balgam iki haftadır geçmiyor",
    "Dizim ağrıyor ve şişti",
    "",
];

fn engine() -> TriageEngine {
    let assets = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets");
    let paths = ArtifactsConfig {
        catalog_path: assets.join("catalog.toml"),
        model_path: assets.join("model.json"),
        rules_path: assets.join("rules.toml"),
    };
    let artifacts = ArtifactSet::load(&paths).expect("shipped artifacts load");
    TriageEngine::new(artifacts, EngineSettings::default()).expect("engine builds")
}

/// Benchmark text normalization
fn bench_normalize(c: &mut Criterion) {
    let normalizer = TextNormalizer::new();

    c.bench_function("normalize_turkish", |b| {
        b.iter(|| normalizer.normalize(black_box(TEXTS[0])));
    });
}

/// Benchmark one statistical assessment
fn bench_assess(c: &mut Criterion) {
    let engine = engine();
    let mut group = c.benchmark_group("assess_sync");

    for (i, text) in TEXTS.iter().enumerate() {
        group.bench_with_input(BenchmarkId::from_parameter(i), text, |b, text| {
            b.iter(|| engine.assess_sync(black_box(text), 3));
        });
    }

    group.finish();
}

/// Benchmark batch assessment throughput
fn bench_batch(c: &mut Criterion) {
    let engine = engine();
    let mut group = c.benchmark_group("assess_batch");

    for size in [16usize, 256] {
        let texts: Vec<String> = TEXTS.iter().cycle().take(size).map(|t| t.to_string()).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &texts, |b, texts| {
            b.iter(|| engine.assess_batch(black_box(texts), 3));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_assess, bench_batch);
criterion_main!(benches);
