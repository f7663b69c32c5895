use crate::error::{AppError, Result};
use crate::models::{ClinicCatalog, Prediction, RankedClinic};
use serde::Deserialize;
use tracing::debug;

const PREDICTOR: &str = "llm";

#[derive(Debug, Deserialize)]
struct RankingResponse {
    rankings: Vec<RankingEntry>,
}

#[derive(Debug, Deserialize)]
struct RankingEntry {
    clinic: String,
    confidence: f64,
}

/// Parse the assistant's ranking JSON into a prediction over the catalog.
///
/// Clinics resolve by id or display name; unknown ones are dropped. A clinic
/// named twice keeps its highest confidence. Confidences are clamped to
/// [0, 1] and rescaled if they sum above 1.
pub fn parse_rankings(content: &str, catalog: &ClinicCatalog) -> Result<Prediction> {
    let body = strip_code_fence(content);
    let response: RankingResponse = serde_json::from_str(body).map_err(|e| AppError::External {
        predictor: PREDICTOR.to_string(),
        message: format!("unparseable ranking: {}", e),
    })?;

    let mut entries: Vec<RankedClinic> = Vec::new();
    for entry in response.rankings {
        let Some(label) = catalog.resolve(&entry.clinic) else {
            debug!(clinic = %entry.clinic, "Dropping unknown clinic from LLM ranking");
            continue;
        };
        let confidence = if entry.confidence.is_finite() {
            entry.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        match entries.iter_mut().find(|r| r.label.id == label.id) {
            Some(existing) => existing.confidence = existing.confidence.max(confidence),
            None => entries.push(RankedClinic::new(label.clone(), confidence)),
        }
    }

    if entries.is_empty() {
        return Err(AppError::External {
            predictor: PREDICTOR.to_string(),
            message: "ranking names no known clinic".to_string(),
        });
    }

    let total: f64 = entries.iter().map(|r| r.confidence).sum();
    if total > 1.0 {
        for entry in &mut entries {
            entry.confidence /= total;
        }
    }

    Ok(Prediction::from_unsorted(entries))
}

/// Remove a surrounding ```json ... ``` fence if present
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClinicLabel;

    fn catalog() -> ClinicCatalog {
        ClinicCatalog::new(vec![
            ClinicLabel::new("noroloji", "Nöroloji"),
            ClinicLabel::new("ic_hastaliklari", "İç Hastalıkları"),
            ClinicLabel::new("kardiyoloji", "Kardiyoloji"),
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_plain_json() {
        let content = r#"{"rankings":[{"clinic":"noroloji","confidence":0.7},{"clinic":"kardiyoloji","confidence":0.2}]}"#;
        let prediction = parse_rankings(content, &catalog()).unwrap();
        assert_eq!(prediction.top().unwrap().label.id, "noroloji");
        assert_eq!(prediction.len(), 2);
    }

    #[test]
    fn test_parse_fenced_json_and_display_names() {
        let content = "```json\n{\"rankings\":[{\"clinic\":\"Ic Hastaliklari\",\"confidence\":0.8}]}\n```";
        let prediction = parse_rankings(content, &catalog()).unwrap();
        assert_eq!(prediction.top().unwrap().label.id, "ic_hastaliklari");
    }

    #[test]
    fn test_unknown_clinics_dropped_and_rescaled() {
        let content = r#"{"rankings":[
            {"clinic":"noroloji","confidence":0.9},
            {"clinic":"astrology","confidence":0.9},
            {"clinic":"kardiyoloji","confidence":0.6},
            {"clinic":"kardiyoloji","confidence":0.3}
        ]}"#;
        let prediction = parse_rankings(content, &catalog()).unwrap();
        assert_eq!(prediction.len(), 2);
        assert!((prediction.total_confidence() - 1.0).abs() < 1e-9);
        assert!((prediction.confidence_of("noroloji") - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_confidences_clamped() {
        let content = r#"{"rankings":[{"clinic":"noroloji","confidence":-2.0},{"clinic":"kardiyoloji","confidence":0.4}]}"#;
        let prediction = parse_rankings(content, &catalog()).unwrap();
        assert_eq!(prediction.confidence_of("noroloji"), 0.0);
        assert_eq!(prediction.top().unwrap().label.id, "kardiyoloji");
    }

    #[test]
    fn test_unusable_rankings() {
        assert!(matches!(
            parse_rankings("not json", &catalog()),
            Err(AppError::External { .. })
        ));
        assert!(matches!(
            parse_rankings(r#"{"rankings":[{"clinic":"astrology","confidence":1.0}]}"#, &catalog()),
            Err(AppError::External { .. })
        ));
    }
}
