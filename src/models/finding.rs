use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a finding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSource {
    /// Matched against the symptom text
    Text,
    /// Produced by a combination rule over other findings
    Combination,
    /// Reported by the imaging collaborator
    Imaging,
}

/// One recognized symptom or emergency indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomFinding {
    /// Matched term (normalized) or combination rule name
    pub term: String,

    /// Category used for deduplication and override lookup
    pub category: String,

    /// Non-negative contribution to the urgency score
    pub severity_weight: f64,

    /// Emergency indicator
    pub is_emergency: bool,

    pub source: FindingSource,
}

impl SymptomFinding {
    pub fn new(
        term: impl Into<String>,
        category: impl Into<String>,
        severity_weight: f64,
        is_emergency: bool,
    ) -> Self {
        Self {
            term: term.into(),
            category: category.into(),
            severity_weight,
            is_emergency,
            source: FindingSource::Text,
        }
    }

    pub fn with_source(mut self, source: FindingSource) -> Self {
        self.source = source;
        self
    }

    /// Whether this finding should replace `other` for the same key: higher
    /// weight wins, emergency breaks ties
    pub fn outranks(&self, other: &SymptomFinding) -> bool {
        self.severity_weight > other.severity_weight
            || (self.severity_weight == other.severity_weight
                && self.is_emergency
                && !other.is_emergency)
    }

    /// Human-readable line for the assessment findings list
    pub fn describe(&self) -> String {
        if self.is_emergency {
            format!("{} ({}, emergency)", self.term, self.category)
        } else {
            format!("{} ({})", self.term, self.category)
        }
    }
}

/// Collapse repeated findings by (category, term), keeping first-seen order.
/// When a key repeats, the stronger finding takes the earlier slot.
pub fn collapse_findings(findings: impl IntoIterator<Item = SymptomFinding>) -> Vec<SymptomFinding> {
    let mut collapsed: Vec<SymptomFinding> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for finding in findings {
        let key = (finding.category.clone(), finding.term.clone());
        match index.get(&key) {
            Some(&i) => {
                if finding.outranks(&collapsed[i]) {
                    collapsed[i] = finding;
                }
            }
            None => {
                index.insert(key, collapsed.len());
                collapsed.push(finding);
            }
        }
    }

    collapsed
}
