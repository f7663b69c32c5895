use crate::models::clinic::ClinicLabel;
use crate::models::finding::SymptomFinding;
use serde::{Deserialize, Serialize};
use strum::Display;

/// A clinic with the confidence one predictor assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedClinic {
    pub label: ClinicLabel,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
}

impl RankedClinic {
    pub fn new(label: ClinicLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// Ranked clinic list from a single predictor, highest confidence first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Prediction {
    ranked: Vec<RankedClinic>,
}

impl Prediction {
    /// Wrap entries that are already in rank order
    pub fn from_ranked(ranked: Vec<RankedClinic>) -> Self {
        Self { ranked }
    }

    /// Sort entries by descending confidence. Equal confidences keep their
    /// input order, so callers control the tie-break.
    pub fn from_unsorted(mut entries: Vec<RankedClinic>) -> Self {
        entries.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Self { ranked: entries }
    }

    pub fn entries(&self) -> &[RankedClinic] {
        &self.ranked
    }

    pub fn into_entries(self) -> Vec<RankedClinic> {
        self.ranked
    }

    pub fn top(&self) -> Option<&RankedClinic> {
        self.ranked.first()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Confidence for a label id, zero if the predictor did not rank it
    pub fn confidence_of(&self, id: &str) -> f64 {
        self.ranked
            .iter()
            .find(|r| r.label.id == id)
            .map(|r| r.confidence)
            .unwrap_or(0.0)
    }

    /// Zero-based rank of a label id
    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.ranked.iter().position(|r| r.label.id == id)
    }

    /// Keep only the first `k` entries
    pub fn truncated(mut self, k: usize) -> Self {
        self.ranked.truncate(k);
        self
    }

    /// Sum of confidences (1.0 for a full softmax distribution)
    pub fn total_confidence(&self) -> f64 {
        self.ranked.iter().map(|r| r.confidence).sum()
    }
}

/// The predictors that can contribute to a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PredictorKind {
    Statistical,
    RuleBased,
    External,
}

/// Output of one predictor, tagged by where it came from
#[derive(Debug, Clone, PartialEq)]
pub enum PredictorOutput {
    Statistical(Prediction),
    RuleBased(Vec<SymptomFinding>),
    External(Prediction),
}

impl PredictorOutput {
    pub fn kind(&self) -> PredictorKind {
        match self {
            PredictorOutput::Statistical(_) => PredictorKind::Statistical,
            PredictorOutput::RuleBased(_) => PredictorKind::RuleBased,
            PredictorOutput::External(_) => PredictorKind::External,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(id: &str, confidence: f64) -> RankedClinic {
        RankedClinic::new(ClinicLabel::new(id, id), confidence)
    }

    #[test]
    fn test_from_unsorted_is_stable_on_ties() {
        let prediction = Prediction::from_unsorted(vec![
            ranked("a", 0.2),
            ranked("b", 0.4),
            ranked("c", 0.2),
            ranked("d", 0.2),
        ]);
        let ids: Vec<_> = prediction.entries().iter().map(|r| r.label.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_lookup_helpers() {
        let prediction = Prediction::from_ranked(vec![ranked("x", 0.7), ranked("y", 0.3)]);
        assert_eq!(prediction.confidence_of("y"), 0.3);
        assert_eq!(prediction.confidence_of("z"), 0.0);
        assert_eq!(prediction.rank_of("y"), Some(1));
        assert_eq!(prediction.top().unwrap().label.id, "x");
        assert!((prediction.total_confidence() - 1.0).abs() < 1e-12);
        assert_eq!(prediction.truncated(1).len(), 1);
    }

    #[test]
    fn test_predictor_kind() {
        let output = PredictorOutput::RuleBased(vec![]);
        assert_eq!(output.kind(), PredictorKind::RuleBased);
        assert_eq!(PredictorKind::External.to_string(), "external");
    }
}
