use crate::error::{AppError, Result};
use crate::models::{collapse_findings, SymptomFinding, UrgencyAssessment, MAX_SCORE, MIN_SCORE};
use tracing::debug;

/// Default extra score for each emergency-flagged finding
pub const DEFAULT_EMERGENCY_INCREMENT: f64 = 3.0;

/// Maps findings to a 1-10 urgency score and tier.
///
/// `score = clamp(1 + Σ weight + Σ_emergency increment, 1, 10)`. Weights are
/// non-negative, so adding a finding never lowers the score. Findings repeated
/// by (category, term) count once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmergencyScorer {
    emergency_increment: f64,
}

impl EmergencyScorer {
    pub fn new(emergency_increment: f64) -> Result<Self> {
        if !emergency_increment.is_finite() || emergency_increment < 0.0 {
            return Err(AppError::Configuration(format!(
                "emergency increment must be a non-negative number, got {}",
                emergency_increment
            )));
        }
        Ok(Self {
            emergency_increment,
        })
    }

    pub fn emergency_increment(&self) -> f64 {
        self.emergency_increment
    }

    /// Score findings from any source (text rules or imaging)
    pub fn score(&self, findings: &[SymptomFinding]) -> UrgencyAssessment {
        let findings = collapse_findings(findings.iter().cloned());
        let raw = findings.iter().fold(MIN_SCORE, |acc, finding| {
            let mut contribution = finding.severity_weight.max(0.0);
            if finding.is_emergency {
                contribution += self.emergency_increment;
            }
            acc + contribution
        });
        let score = raw.clamp(MIN_SCORE, MAX_SCORE);

        let assessment =
            UrgencyAssessment::from_score(score, findings.iter().map(|f| f.describe()).collect());

        debug!(
            raw_score = raw,
            score = assessment.score,
            tier = %assessment.tier,
            findings = findings.len(),
            "Scored findings"
        );

        assessment
    }
}

impl Default for EmergencyScorer {
    fn default() -> Self {
        Self {
            emergency_increment: DEFAULT_EMERGENCY_INCREMENT,
        }
    }
}
