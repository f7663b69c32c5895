use crate::ml::normalizer::{NormalizedText, TextNormalizer};
use crate::models::{FindingSource, SymptomFinding};
use crate::rules::dictionary::RuleDictionary;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Keyword extractor for symptoms and emergency indicators.
///
/// Works on normalized text only and never consults the classifier.
#[derive(Debug, Clone)]
pub struct SymptomRuleEngine {
    normalizer: TextNormalizer,
    dictionary: Arc<RuleDictionary>,
}

impl SymptomRuleEngine {
    pub fn new(dictionary: Arc<RuleDictionary>) -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            dictionary,
        }
    }

    /// Extract findings from raw text
    pub fn extract(&self, raw: &str) -> Vec<SymptomFinding> {
        self.extract_normalized(&self.normalizer.normalize(raw))
    }

    /// Extract findings from already normalized text.
    ///
    /// One finding per category: the highest weight wins, emergency breaks
    /// ties. Combination findings are appended after text findings, in
    /// dictionary order.
    pub fn extract_normalized(&self, text: &NormalizedText) -> Vec<SymptomFinding> {
        if text.is_empty() {
            return Vec::new();
        }

        let joined = text.joined();
        let mut findings = FindingSet::default();

        for term in self.dictionary.terms() {
            if term.is_match(&joined) {
                findings.insert(SymptomFinding::new(
                    term.phrase.clone(),
                    term.category.clone(),
                    term.weight,
                    term.emergency,
                ));
            }
        }

        for rule in self.dictionary.combinations() {
            if rule.requires.iter().all(|c| findings.contains(c)) {
                debug!(rule = %rule.name, category = %rule.category, "Combination rule fired");
                findings.insert(
                    SymptomFinding::new(
                        rule.name.clone(),
                        rule.category.clone(),
                        rule.weight,
                        rule.emergency,
                    )
                    .with_source(FindingSource::Combination),
                );
            }
        }

        findings.into_vec()
    }

    pub fn dictionary(&self) -> &Arc<RuleDictionary> {
        &self.dictionary
    }
}

/// Findings keyed by category, in first-seen order
#[derive(Default)]
struct FindingSet {
    findings: Vec<SymptomFinding>,
    index: HashMap<String, usize>,
}

impl FindingSet {
    fn insert(&mut self, finding: SymptomFinding) {
        match self.index.get(&finding.category) {
            Some(&i) => {
                if finding.outranks(&self.findings[i]) {
                    self.findings[i] = finding;
                }
            }
            None => {
                self.index
                    .insert(finding.category.clone(), self.findings.len());
                self.findings.push(finding);
            }
        }
    }

    fn contains(&self, category: &str) -> bool {
        self.index.contains_key(category)
    }

    fn into_vec(self) -> Vec<SymptomFinding> {
        self.findings
    }
}
