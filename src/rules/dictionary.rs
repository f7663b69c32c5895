use crate::error::{AppError, Result};
use crate::ml::normalizer::TextNormalizer;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `[[terms]]` entry of the rules file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTerm {
    /// Phrase as written by the curator (any casing or accents)
    pub term: String,

    pub category: String,

    /// Contribution to the urgency score
    pub weight: f64,

    #[serde(default)]
    pub emergency: bool,

    /// Match whole tokens only, without trailing suffixes
    #[serde(default)]
    pub whole_word: bool,
}

/// One `[[combinations]]` entry: fires when every required category is present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationRule {
    pub name: String,

    pub requires: Vec<String>,

    pub category: String,

    pub weight: f64,

    /// Combinations are emergencies unless stated otherwise
    #[serde(default = "default_true")]
    pub emergency: bool,
}

/// On-disk layout of `rules.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub terms: Vec<RuleTerm>,

    #[serde(default)]
    pub combinations: Vec<CombinationRule>,

    /// Emergency category -> clinic label id
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

impl RulesFile {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|e| AppError::ModelUnavailable(format!("invalid rules file: {}", e)))
    }
}

/// Dictionary term compiled for matching
#[derive(Debug, Clone)]
pub struct CompiledTerm {
    /// Normalized phrase, tokens joined by single spaces
    pub phrase: String,

    pub category: String,

    pub weight: f64,

    pub emergency: bool,

    pattern: Regex,
}

impl CompiledTerm {
    /// Matches at a token boundary; trailing suffixes are allowed unless the
    /// term is whole-word
    pub fn is_match(&self, joined: &str) -> bool {
        self.pattern.is_match(joined)
    }
}

/// Immutable symptom dictionary
#[derive(Debug, Clone)]
pub struct RuleDictionary {
    terms: Vec<CompiledTerm>,
    combinations: Vec<CombinationRule>,
}

impl RuleDictionary {
    /// Normalize and compile every term. Any invalid entry rejects the whole file.
    pub fn compile(file: &RulesFile, normalizer: &TextNormalizer) -> Result<Self> {
        let mut terms = Vec::with_capacity(file.terms.len());

        for entry in &file.terms {
            validate_weight(&entry.term, entry.weight)?;
            validate_category(&entry.term, &entry.category)?;

            let phrase = normalizer.normalize(&entry.term).joined();
            if phrase.is_empty() {
                return Err(AppError::ModelUnavailable(format!(
                    "rule term '{}' normalizes to nothing",
                    entry.term
                )));
            }

            let escaped = regex::escape(&phrase);
            let source = if entry.whole_word {
                format!(r"\b{}\b", escaped)
            } else {
                format!(r"\b{}", escaped)
            };
            let pattern = Regex::new(&source).map_err(|e| {
                AppError::ModelUnavailable(format!("rule term '{}': {}", entry.term, e))
            })?;

            terms.push(CompiledTerm {
                phrase,
                category: entry.category.clone(),
                weight: entry.weight,
                emergency: entry.emergency,
                pattern,
            });
        }

        for rule in &file.combinations {
            validate_weight(&rule.name, rule.weight)?;
            validate_category(&rule.name, &rule.category)?;
            if rule.requires.is_empty() {
                return Err(AppError::ModelUnavailable(format!(
                    "combination '{}' requires no categories",
                    rule.name
                )));
            }
        }

        Ok(Self {
            terms,
            combinations: file.combinations.clone(),
        })
    }

    pub fn terms(&self) -> &[CompiledTerm] {
        &self.terms
    }

    pub fn combinations(&self) -> &[CombinationRule] {
        &self.combinations
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn validate_weight(name: &str, weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(AppError::ModelUnavailable(format!(
            "rule '{}' has invalid weight {}",
            name, weight
        )));
    }
    Ok(())
}

fn validate_category(name: &str, category: &str) -> Result<()> {
    if category.trim().is_empty() {
        return Err(AppError::ModelUnavailable(format!(
            "rule '{}' has an empty category",
            name
        )));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
[[terms]]
term = "Baş ağrısı"
category = "headache"
weight = 1.0

[[terms]]
term = "göğüs ağrısı"
category = "chest_pain"
weight = 2.0

[[combinations]]
name = "cardiac"
requires = ["chest_pain", "cold_sweat"]
category = "cardiac_emergency"
weight = 3.0

[overrides]
cardiac_emergency = "kardiyoloji"
"#;

    #[test]
    fn test_compile_normalizes_terms() {
        let file = RulesFile::from_toml_str(RULES).unwrap();
        let dictionary = RuleDictionary::compile(&file, &TextNormalizer::new()).unwrap();

        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.terms()[0].phrase, "bas agrisi");
        assert!(!dictionary.terms()[0].emergency);
        assert!(dictionary.combinations()[0].emergency);
        assert_eq!(file.overrides["cardiac_emergency"], "kardiyoloji");
    }

    #[test]
    fn test_term_matches_at_token_boundary() {
        let file = RulesFile {
            terms: vec![RuleTerm {
                term: "ağrı".to_string(),
                category: "pain".to_string(),
                weight: 1.0,
                emergency: false,
                whole_word: false,
            }],
            ..Default::default()
        };
        let dictionary = RuleDictionary::compile(&file, &TextNormalizer::new()).unwrap();
        let term = &dictionary.terms()[0];

        assert!(term.is_match("bas agrim"));
        assert!(term.is_match("agri"));
        assert!(!term.is_match("bagrisi"));
    }

    #[test]
    fn test_whole_word_term_rejects_suffixes() {
        let raw = r#"
[[terms]]
term = "kırık"
category = "fracture"
weight = 1.5
whole_word = true
"#;
        let file = RulesFile::from_toml_str(raw).unwrap();
        let dictionary = RuleDictionary::compile(&file, &TextNormalizer::new()).unwrap();
        let term = &dictionary.terms()[0];

        assert!(term.is_match("kolum kirik"));
        assert!(term.is_match("kirik kol"));
        assert!(!term.is_match("halsizlik kiriklik"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let file = RulesFile {
            terms: vec![RuleTerm {
                term: "ateş".to_string(),
                category: "fever".to_string(),
                weight: -1.0,
                emergency: false,
                whole_word: false,
            }],
            ..Default::default()
        };
        assert!(matches!(
            RuleDictionary::compile(&file, &TextNormalizer::new()),
            Err(AppError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_stopword_only_term_rejected() {
        let file = RulesFile {
            terms: vec![RuleTerm {
                term: "ve".to_string(),
                category: "noise".to_string(),
                weight: 0.5,
                emergency: false,
                whole_word: false,
            }],
            ..Default::default()
        };
        assert!(RuleDictionary::compile(&file, &TextNormalizer::new()).is_err());
    }

    #[test]
    fn test_malformed_file() {
        assert!(matches!(
            RulesFile::from_toml_str("[[terms]]\nterm = 3"),
            Err(AppError::ModelUnavailable(_))
        ));
    }
}
