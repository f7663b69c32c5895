use crate::error::{AppError, Result};
use crate::models::{ClinicCatalog, EmergencyOverride, SymptomFinding};
use std::collections::BTreeMap;

/// Emergency category -> clinic label that must be ranked first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideTable {
    entries: BTreeMap<String, String>,
}

impl OverrideTable {
    /// Build the table, rejecting labels missing from the catalog
    pub fn new(entries: BTreeMap<String, String>, catalog: &ClinicCatalog) -> Result<Self> {
        for (category, label_id) in &entries {
            if !catalog.contains(label_id) {
                return Err(AppError::InvalidInput(format!(
                    "override for '{}' points to unknown clinic '{}'",
                    category, label_id
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, category: &str) -> Option<&str> {
        self.entries.get(category).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick the override to apply, if any.
    ///
    /// Only emergency findings qualify. The highest severity weight wins,
    /// then the lexicographically smallest category.
    pub fn select(&self, findings: &[SymptomFinding]) -> Option<EmergencyOverride> {
        findings
            .iter()
            .filter(|f| f.is_emergency)
            .filter_map(|f| self.get(&f.category).map(|label| (f, label)))
            .min_by(|(a, _), (b, _)| {
                b.severity_weight
                    .total_cmp(&a.severity_weight)
                    .then_with(|| a.category.cmp(&b.category))
            })
            .map(|(finding, label)| EmergencyOverride {
                category: finding.category.clone(),
                label_id: label.to_string(),
            })
    }
}
