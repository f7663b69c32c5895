use crate::error::{AppError, Result};
use crate::fusion::overrides::OverrideTable;
use crate::models::{
    collapse_findings, ClinicCatalog, FusedRecommendation, Prediction, PredictorContribution,
    PredictorKind, PredictorOutput, Provenance, RankedClinic, SymptomFinding,
};
use crate::scoring::EmergencyScorer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Relative trust in the statistical model and the LLM opinion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub statistical: f64,
    pub llm: f64,
}

impl FusionWeights {
    pub fn new(statistical: f64, llm: f64) -> Self {
        Self { statistical, llm }
    }

    /// Weights scaled to sum to 1
    pub fn normalized(&self) -> Result<(f64, f64)> {
        let valid = |w: f64| w.is_finite() && w >= 0.0;
        if !valid(self.statistical) || !valid(self.llm) {
            return Err(AppError::InvalidInput(format!(
                "fusion weights must be non-negative numbers (statistical={}, llm={})",
                self.statistical, self.llm
            )));
        }

        let total = self.statistical + self.llm;
        if total <= 0.0 {
            return Err(AppError::InvalidInput(
                "fusion weights must not both be zero".to_string(),
            ));
        }

        Ok((self.statistical / total, self.llm / total))
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            statistical: 0.6,
            llm: 0.4,
        }
    }
}

/// Combines predictor outputs into one recommendation
#[derive(Debug, Clone)]
pub struct ResultFusion {
    catalog: Arc<ClinicCatalog>,
    overrides: Arc<OverrideTable>,
    scorer: EmergencyScorer,
}

impl ResultFusion {
    pub fn new(
        catalog: Arc<ClinicCatalog>,
        overrides: Arc<OverrideTable>,
        scorer: EmergencyScorer,
    ) -> Self {
        Self {
            catalog,
            overrides,
            scorer,
        }
    }

    /// Fuse the outputs of one request.
    ///
    /// Exactly one statistical output is required and at most one external
    /// opinion is accepted. Rule findings may come in several parts; repeats
    /// across parts are collapsed.
    pub fn fuse(
        &self,
        outputs: &[PredictorOutput],
        weights: &FusionWeights,
    ) -> Result<FusedRecommendation> {
        let mut statistical = None;
        let mut external = None;
        let mut findings: Vec<SymptomFinding> = Vec::new();

        for output in outputs {
            match output {
                PredictorOutput::Statistical(prediction) => {
                    if statistical.replace(prediction).is_some() {
                        return Err(AppError::InvalidInput(
                            "more than one statistical prediction".to_string(),
                        ));
                    }
                }
                PredictorOutput::External(prediction) => {
                    if external.replace(prediction).is_some() {
                        return Err(AppError::InvalidInput(
                            "more than one external prediction".to_string(),
                        ));
                    }
                }
                PredictorOutput::RuleBased(rule_findings) => {
                    findings.extend(rule_findings.iter().cloned());
                }
            }
        }

        let findings = collapse_findings(findings);
        let statistical = statistical.ok_or_else(|| {
            AppError::InvalidInput("fusion requires a statistical prediction".to_string())
        })?;

        let mut contributions = Vec::new();
        let mut ranked = match external {
            None => {
                contributions.push(PredictorContribution {
                    predictor: PredictorKind::Statistical,
                    weight: 1.0,
                });
                statistical.entries().to_vec()
            }
            Some(llm) => {
                let (w_stat, w_llm) = weights.normalized()?;
                contributions.push(PredictorContribution {
                    predictor: PredictorKind::Statistical,
                    weight: w_stat,
                });
                contributions.push(PredictorContribution {
                    predictor: PredictorKind::External,
                    weight: w_llm,
                });
                blend(statistical, llm, w_stat, w_llm)
            }
        };

        if !findings.is_empty() {
            contributions.push(PredictorContribution {
                predictor: PredictorKind::RuleBased,
                weight: 0.0,
            });
        }

        let emergency_override = self.overrides.select(&findings);
        if let Some(forced) = &emergency_override {
            self.force_top(&mut ranked, &forced.label_id);
            info!(
                category = %forced.category,
                label = %forced.label_id,
                "Emergency override applied"
            );
        }

        let urgency = self.scorer.score(&findings);
        let provenance = Provenance {
            contributions,
            emergency_override,
            ..Default::default()
        };

        Ok(FusedRecommendation::new(ranked, urgency, findings, provenance))
    }

    fn force_top(&self, ranked: &mut Vec<RankedClinic>, label_id: &str) {
        let forced = match ranked.iter().position(|r| r.label.id == label_id) {
            Some(index) => ranked.remove(index),
            None => match self.catalog.by_id(label_id) {
                Some(label) => RankedClinic::new(label.clone(), 0.0),
                None => return,
            },
        };
        ranked.insert(0, forced);
    }
}

/// Weighted blend over the union of labels.
///
/// Candidates are laid out in statistical rank order followed by labels only
/// the LLM named, in LLM order; the stable sort keeps that order on ties.
fn blend(statistical: &Prediction, llm: &Prediction, w_stat: f64, w_llm: f64) -> Vec<RankedClinic> {
    let mut seen = HashSet::new();
    let candidates = statistical
        .entries()
        .iter()
        .chain(llm.entries())
        .filter(|r| seen.insert(r.label.id.clone()))
        .map(|r| {
            let id = r.label.id.as_str();
            let confidence = w_stat * statistical.confidence_of(id) + w_llm * llm.confidence_of(id);
            RankedClinic::new(r.label.clone(), confidence)
        })
        .collect();

    let blended = Prediction::from_unsorted(candidates);
    debug!(candidates = blended.len(), "Blended statistical and LLM rankings");
    blended.into_entries()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClinicLabel;
    use std::collections::BTreeMap;

    fn label(id: &str) -> ClinicLabel {
        ClinicLabel::new(id, id)
    }

    fn catalog() -> Arc<ClinicCatalog> {
        Arc::new(
            ClinicCatalog::new(vec![
                label("noroloji"),
                label("ic_hastaliklari"),
                label("kardiyoloji"),
                label("acil"),
            ])
            .unwrap(),
        )
    }

    fn fusion() -> ResultFusion {
        let mut entries = BTreeMap::new();
        entries.insert("cardiac_emergency".to_string(), "kardiyoloji".to_string());
        let overrides = OverrideTable::new(entries, &catalog()).unwrap();
        ResultFusion::new(catalog(), Arc::new(overrides), EmergencyScorer::default())
    }

    fn prediction(entries: &[(&str, f64)]) -> Prediction {
        Prediction::from_ranked(
            entries
                .iter()
                .map(|(id, c)| RankedClinic::new(label(id), *c))
                .collect(),
        )
    }

    fn ids(recommendation: &FusedRecommendation) -> Vec<&str> {
        recommendation.clinics.iter().map(|r| r.label.id.as_str()).collect()
    }

    #[test]
    fn test_without_llm_statistical_is_unchanged() {
        let statistical = prediction(&[("noroloji", 0.5), ("ic_hastaliklari", 0.3), ("acil", 0.2)]);
        let result = fusion()
            .fuse(
                &[PredictorOutput::Statistical(statistical.clone())],
                &FusionWeights::default(),
            )
            .unwrap();

        assert_eq!(result.clinics, statistical.entries());
        assert_eq!(result.provenance.contributions.len(), 1);
        assert!(result.provenance.emergency_override.is_none());
    }

    #[test]
    fn test_blend_with_llm() {
        let statistical = prediction(&[("noroloji", 0.6), ("ic_hastaliklari", 0.4)]);
        let llm = prediction(&[("ic_hastaliklari", 0.9), ("kardiyoloji", 0.1)]);
        let result = fusion()
            .fuse(
                &[
                    PredictorOutput::Statistical(statistical),
                    PredictorOutput::External(llm),
                ],
                &FusionWeights::new(1.0, 1.0),
            )
            .unwrap();

        // noroloji 0.30, ic_hastaliklari 0.65, kardiyoloji 0.05
        assert_eq!(ids(&result), vec!["ic_hastaliklari", "noroloji", "kardiyoloji"]);
        assert!((result.clinics[0].confidence - 0.65).abs() < 1e-9);
        assert_eq!(result.provenance.contributions[1].predictor, PredictorKind::External);
        assert!((result.provenance.contributions[1].weight - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_blend_ties_follow_statistical_rank() {
        let statistical = prediction(&[("noroloji", 0.5), ("ic_hastaliklari", 0.5)]);
        let llm = prediction(&[("ic_hastaliklari", 0.5), ("noroloji", 0.5)]);
        let result = fusion()
            .fuse(
                &[
                    PredictorOutput::Statistical(statistical),
                    PredictorOutput::External(llm),
                ],
                &FusionWeights::default(),
            )
            .unwrap();
        assert_eq!(ids(&result), vec!["noroloji", "ic_hastaliklari"]);
    }

    #[test]
    fn test_override_forces_top_label() {
        let statistical = prediction(&[("noroloji", 0.7), ("ic_hastaliklari", 0.2), ("kardiyoloji", 0.1)]);
        let findings = vec![SymptomFinding::new("cardiac emergency", "cardiac_emergency", 3.0, true)];
        let result = fusion()
            .fuse(
                &[
                    PredictorOutput::Statistical(statistical),
                    PredictorOutput::RuleBased(findings),
                ],
                &FusionWeights::default(),
            )
            .unwrap();

        assert_eq!(ids(&result), vec!["kardiyoloji", "noroloji", "ic_hastaliklari"]);
        assert_eq!(result.clinics[0].confidence, 0.1);
        let forced = result.provenance.emergency_override.unwrap();
        assert_eq!(forced.label_id, "kardiyoloji");
    }

    #[test]
    fn test_override_inserts_missing_label() {
        let statistical = prediction(&[("noroloji", 1.0)]);
        let findings = vec![SymptomFinding::new("cardiac emergency", "cardiac_emergency", 3.0, true)];
        let result = fusion()
            .fuse(
                &[
                    PredictorOutput::Statistical(statistical),
                    PredictorOutput::RuleBased(findings),
                ],
                &FusionWeights::default(),
            )
            .unwrap();
        assert_eq!(ids(&result), vec!["kardiyoloji", "noroloji"]);
        assert_eq!(result.clinics[0].confidence, 0.0);
    }

    #[test]
    fn test_overlapping_rule_parts_collapse() {
        let statistical = prediction(&[("noroloji", 0.6), ("kardiyoloji", 0.4)]);
        let chest_pain = SymptomFinding::new("chest pain", "chest_pain", 2.0, false);
        let result = fusion()
            .fuse(
                &[
                    PredictorOutput::Statistical(statistical),
                    PredictorOutput::RuleBased(vec![chest_pain.clone()]),
                    PredictorOutput::RuleBased(vec![chest_pain]),
                ],
                &FusionWeights::default(),
            )
            .unwrap();

        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.urgency.score, 3.0);
        assert_eq!(result.urgency.tier, crate::models::UrgencyTier::Low);
    }

    #[test]
    fn test_invalid_weights() {
        let statistical = PredictorOutput::Statistical(prediction(&[("noroloji", 1.0)]));
        let llm = PredictorOutput::External(prediction(&[("acil", 1.0)]));
        let outputs = [statistical, llm];

        for weights in [
            FusionWeights::new(-0.1, 1.0),
            FusionWeights::new(0.0, 0.0),
            FusionWeights::new(f64::NAN, 1.0),
        ] {
            assert!(matches!(
                fusion().fuse(&outputs, &weights),
                Err(AppError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_missing_statistical_output() {
        let result = fusion().fuse(&[PredictorOutput::RuleBased(vec![])], &FusionWeights::default());
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
