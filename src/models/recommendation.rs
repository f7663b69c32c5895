use crate::models::finding::SymptomFinding;
use crate::models::prediction::{PredictorKind, RankedClinic};
use crate::models::urgency::UrgencyAssessment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// What happened with the optional LLM opinion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LlmStatus {
    /// Caller did not ask for it
    #[default]
    NotRequested,
    /// Requested but no external predictor is configured
    NotConfigured,
    /// Blended into the result
    Used,
    /// Did not answer in time, result is statistical-only
    TimedOut,
    /// Answered with an error or an unusable ranking, result is statistical-only
    Failed,
}

impl LlmStatus {
    /// True when an LLM opinion was requested but could not be used
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            LlmStatus::NotConfigured | LlmStatus::TimedOut | LlmStatus::Failed
        )
    }
}

/// One predictor and the weight it carried in the blend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorContribution {
    pub predictor: PredictorKind,
    pub weight: f64,
}

/// Forced top-1 label caused by an emergency finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyOverride {
    pub category: String,
    pub label_id: String,
}

/// How a recommendation was produced
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Provenance {
    pub contributions: Vec<PredictorContribution>,

    pub llm_status: LlmStatus,

    pub emergency_override: Option<EmergencyOverride>,

    pub model_version: Option<String>,

    /// SHA-256 of the model artifact
    pub model_fingerprint: Option<String>,
}

/// Non-fatal conditions worth surfacing to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssessmentWarning {
    /// Input normalized to zero tokens
    DegenerateInput,
    /// LLM opinion was requested but the result fell back to statistical-only
    ExternalPredictorDegraded,
}

/// Final triage answer for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedRecommendation {
    pub assessment_id: Uuid,

    pub assessed_at: DateTime<Utc>,

    /// Ranked clinics, best first
    pub clinics: Vec<RankedClinic>,

    pub urgency: UrgencyAssessment,

    pub findings: Vec<SymptomFinding>,

    pub provenance: Provenance,

    #[serde(default)]
    pub warnings: Vec<AssessmentWarning>,
}

impl FusedRecommendation {
    pub fn new(
        clinics: Vec<RankedClinic>,
        urgency: UrgencyAssessment,
        findings: Vec<SymptomFinding>,
        provenance: Provenance,
    ) -> Self {
        Self {
            assessment_id: Uuid::new_v4(),
            assessed_at: Utc::now(),
            clinics,
            urgency,
            findings,
            provenance,
            warnings: Vec::new(),
        }
    }

    pub fn top(&self) -> Option<&RankedClinic> {
        self.clinics.first()
    }

    pub fn with_warning(mut self, warning: AssessmentWarning) -> Self {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
        self
    }

    pub fn has_warning(&self, warning: AssessmentWarning) -> bool {
        self.warnings.contains(&warning)
    }
}
