use crate::error::{AppError, Result};
use crate::ml::normalizer::fold_key;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A medical specialty that triage can route to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClinicLabel {
    /// Stable identifier (e.g. `kardiyoloji`)
    pub id: String,

    /// Display name (e.g. `Kardiyoloji`)
    pub name: String,
}

impl ClinicLabel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// On-disk layout of `catalog.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub clinics: Vec<ClinicLabel>,
}

/// Fixed, ordered clinic catalog.
///
/// Insertion order is significant: it is the tie-break order whenever two
/// labels end up with the same confidence.
#[derive(Debug, Clone)]
pub struct ClinicCatalog {
    labels: Vec<ClinicLabel>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl ClinicCatalog {
    /// Build a catalog, rejecting empty catalogs and duplicate ids
    pub fn new(labels: Vec<ClinicLabel>) -> Result<Self> {
        if labels.is_empty() {
            return Err(AppError::ModelUnavailable(
                "clinic catalog is empty".to_string(),
            ));
        }

        let mut by_id = HashMap::with_capacity(labels.len());
        let mut by_name = HashMap::with_capacity(labels.len());

        for (idx, label) in labels.iter().enumerate() {
            if label.id.trim().is_empty() || label.name.trim().is_empty() {
                return Err(AppError::ModelUnavailable(format!(
                    "clinic #{} has an empty id or name",
                    idx
                )));
            }
            if by_id.insert(label.id.clone(), idx).is_some() {
                return Err(AppError::ModelUnavailable(format!(
                    "duplicate clinic id '{}'",
                    label.id
                )));
            }
            by_name.entry(fold_key(&label.name)).or_insert(idx);
        }

        Ok(Self {
            labels,
            by_id,
            by_name,
        })
    }

    /// Parse a catalog from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(raw)
            .map_err(|e| AppError::ModelUnavailable(format!("invalid catalog: {}", e)))?;
        Self::new(file.clinics)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[ClinicLabel] {
        &self.labels
    }

    pub fn get(&self, index: usize) -> Option<&ClinicLabel> {
        self.labels.get(index)
    }

    /// Catalog position of a label id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn by_id(&self, id: &str) -> Option<&ClinicLabel> {
        self.position(id).and_then(|idx| self.labels.get(idx))
    }

    /// Resolve free-form text (id or display name, any casing or accents)
    pub fn resolve(&self, raw: &str) -> Option<&ClinicLabel> {
        let trimmed = raw.trim();
        if let Some(label) = self.by_id(trimmed) {
            return Some(label);
        }
        let key = fold_key(trimmed);
        self.by_name
            .get(&key)
            .or_else(|| self.by_id.get(&key.replace(' ', "_")))
            .and_then(|&idx| self.labels.get(idx))
    }
}
