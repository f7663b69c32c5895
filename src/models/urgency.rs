use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{Display, EnumString};

/// Lowest possible urgency score
pub const MIN_SCORE: f64 = 1.0;

/// Highest possible urgency score
pub const MAX_SCORE: f64 = 10.0;

/// Discrete urgency bucket
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyTier {
    Low,      // [1, 4)  - within 24 hours
    Moderate, // [4, 6)  - within 2 hours
    High,     // [6, 8)  - within 30 minutes
    Critical, // [8, 10] - within 15 minutes
}

impl UrgencyTier {
    /// Map a score to its tier. Lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            UrgencyTier::Critical
        } else if score >= 6.0 {
            UrgencyTier::High
        } else if score >= 4.0 {
            UrgencyTier::Moderate
        } else {
            UrgencyTier::Low
        }
    }

    /// Recommended maximum time until the patient is seen
    pub fn response_time(&self) -> Duration {
        match self {
            UrgencyTier::Low => Duration::from_secs(24 * 60 * 60),
            UrgencyTier::Moderate => Duration::from_secs(2 * 60 * 60),
            UrgencyTier::High => Duration::from_secs(30 * 60),
            UrgencyTier::Critical => Duration::from_secs(15 * 60),
        }
    }

    pub fn response_time_minutes(&self) -> u32 {
        (self.response_time().as_secs() / 60) as u32
    }

    /// Check if the tier requires immediate escalation
    pub fn requires_escalation(&self) -> bool {
        matches!(self, UrgencyTier::High | UrgencyTier::Critical)
    }

    /// Short action recommendation shown to the caller
    pub fn recommendation(&self) -> &'static str {
        match self {
            UrgencyTier::Low => "Book a routine appointment within 24 hours",
            UrgencyTier::Moderate => "Arrange a same-day visit within 2 hours",
            UrgencyTier::High => "Escalate to on-duty staff within 30 minutes",
            UrgencyTier::Critical => "Escalate immediately to emergency care within 15 minutes",
        }
    }
}

/// Urgency result produced by the emergency scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyAssessment {
    /// Score in [1, 10]
    pub score: f64,

    pub tier: UrgencyTier,

    pub response_time_minutes: u32,

    pub requires_escalation: bool,

    pub recommendation: String,

    /// Human-readable findings that drove the score
    pub findings: Vec<String>,
}

impl UrgencyAssessment {
    /// Build an assessment from an already clamped score
    pub fn from_score(score: f64, findings: Vec<String>) -> Self {
        let tier = UrgencyTier::from_score(score);
        Self {
            score,
            tier,
            response_time_minutes: tier.response_time_minutes(),
            requires_escalation: tier.requires_escalation(),
            recommendation: tier.recommendation().to_string(),
            findings,
        }
    }

    /// Assessment for input with nothing to report
    pub fn baseline() -> Self {
        Self::from_score(MIN_SCORE, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries_are_exact() {
        assert_eq!(UrgencyTier::from_score(1.0), UrgencyTier::Low);
        assert_eq!(UrgencyTier::from_score(3.999), UrgencyTier::Low);
        assert_eq!(UrgencyTier::from_score(4.0), UrgencyTier::Moderate);
        assert_eq!(UrgencyTier::from_score(5.999), UrgencyTier::Moderate);
        assert_eq!(UrgencyTier::from_score(6.0), UrgencyTier::High);
        assert_eq!(UrgencyTier::from_score(7.999), UrgencyTier::High);
        assert_eq!(UrgencyTier::from_score(8.0), UrgencyTier::Critical);
        assert_eq!(UrgencyTier::from_score(10.0), UrgencyTier::Critical);
    }

    #[test]
    fn test_response_times() {
        assert_eq!(UrgencyTier::Low.response_time_minutes(), 24 * 60);
        assert_eq!(UrgencyTier::Moderate.response_time_minutes(), 120);
        assert_eq!(UrgencyTier::High.response_time_minutes(), 30);
        assert_eq!(UrgencyTier::Critical.response_time_minutes(), 15);
    }

    #[test]
    fn test_escalation_flag() {
        assert!(!UrgencyTier::Low.requires_escalation());
        assert!(!UrgencyTier::Moderate.requires_escalation());
        assert!(UrgencyTier::High.requires_escalation());
        assert!(UrgencyTier::Critical.requires_escalation());
    }

    #[test]
    fn test_tier_display_and_parse() {
        assert_eq!(UrgencyTier::Critical.to_string(), "CRITICAL");
        assert_eq!("MODERATE".parse::<UrgencyTier>().unwrap(), UrgencyTier::Moderate);
    }

    #[test]
    fn test_baseline_assessment() {
        let assessment = UrgencyAssessment::baseline();
        assert_eq!(assessment.score, 1.0);
        assert_eq!(assessment.tier, UrgencyTier::Low);
        assert!(assessment.findings.is_empty());
    }
}
