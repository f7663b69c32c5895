use crate::error::Result;
use crate::models::{collapse_findings, FindingSource, SymptomFinding, UrgencyAssessment};
use crate::scoring::emergency::EmergencyScorer;
use async_trait::async_trait;
use tracing::info;

/// Radiology collaborator that reports findings from an image
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Get analyzer name
    fn name(&self) -> &str;

    /// Analyze raw image bytes
    async fn analyze(&self, image: &[u8]) -> Result<Vec<SymptomFinding>>;
}

/// Run an analyzer and score its findings the same way as text findings.
/// Repeated findings are collapsed before scoring.
pub async fn score_image(
    analyzer: &dyn ImageAnalyzer,
    scorer: &EmergencyScorer,
    image: &[u8],
) -> Result<(Vec<SymptomFinding>, UrgencyAssessment)> {
    let findings = collapse_findings(
        analyzer
            .analyze(image)
            .await?
            .into_iter()
            .map(|f| f.with_source(FindingSource::Imaging)),
    );

    let assessment = scorer.score(&findings);
    info!(
        analyzer = analyzer.name(),
        findings = findings.len(),
        tier = %assessment.tier,
        "Image analyzed"
    );

    Ok((findings, assessment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::UrgencyTier;

    struct FixedAnalyzer(Vec<SymptomFinding>);

    #[async_trait]
    impl ImageAnalyzer for FixedAnalyzer {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn analyze(&self, image: &[u8]) -> Result<Vec<SymptomFinding>> {
            if image.is_empty() {
                return Err(AppError::InvalidInput("empty image".to_string()));
            }
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_image_findings_feed_scorer() {
        let analyzer = FixedAnalyzer(vec![SymptomFinding::new(
            "intracranial hemorrhage",
            "hemorrhage",
            4.0,
            true,
        )]);
        let (findings, assessment) = score_image(&analyzer, &EmergencyScorer::default(), b"png")
            .await
            .unwrap();

        assert_eq!(findings[0].source, FindingSource::Imaging);
        assert_eq!(assessment.score, 8.0);
        assert_eq!(assessment.tier, UrgencyTier::Critical);
    }

    #[tokio::test]
    async fn test_repeated_image_findings_count_once() {
        let pneumothorax = SymptomFinding::new("pneumothorax", "pneumothorax", 2.0, false);
        let analyzer = FixedAnalyzer(vec![pneumothorax.clone(), pneumothorax]);
        let (findings, assessment) = score_image(&analyzer, &EmergencyScorer::default(), b"png")
            .await
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(assessment.score, 3.0);
        assert_eq!(assessment.tier, UrgencyTier::Low);
    }

    #[tokio::test]
    async fn test_analyzer_error_propagates() {
        let analyzer = FixedAnalyzer(vec![]);
        let result = score_image(&analyzer, &EmergencyScorer::default(), b"").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
