use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Longest accepted complaint text, in characters
pub const MAX_TEXT_LEN: usize = 10_000;

/// One triage request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AssessRequest {
    /// Free text or transcribed speech
    #[validate(custom(function = "validate_text_len"))]
    pub text: String,

    /// Number of clinics to return; the configured default when absent
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub top_k: Option<usize>,

    /// Ask the external LLM for a second opinion
    #[serde(default)]
    pub use_llm: bool,
}

impl AssessRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            top_k: None,
            use_llm: false,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_llm(mut self) -> Self {
        self.use_llm = true;
        self
    }
}

/// Reject complaint texts longer than `MAX_TEXT_LEN` characters
pub fn check_text(text: &str) -> Result<()> {
    validate_text_len(text).map_err(|_| {
        AppError::InvalidInput(format!(
            "text must be at most {} characters",
            MAX_TEXT_LEN
        ))
    })
}

fn validate_text_len(text: &str) -> std::result::Result<(), ValidationError> {
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::new("text_too_long"));
    }
    Ok(())
}
