/// Rule-based symptom extraction
///
/// A curated dictionary of symptom phrases and emergency indicators matched
/// against normalized text, plus combination rules that raise an emergency
/// when several categories occur together.

pub mod dictionary;
pub mod engine;

pub use dictionary::{CombinationRule, CompiledTerm, RuleDictionary, RuleTerm, RulesFile};
pub use engine::SymptomRuleEngine;
