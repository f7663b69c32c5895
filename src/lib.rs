//! Clinic triage engine.
//!
//! Routes free-text patient complaints to a clinic and assigns an urgency
//! tier. A TF-IDF + linear softmax classifier ranks clinics, a keyword rule
//! engine extracts symptoms and emergency indicators, and an optional LLM
//! opinion is blended in. Emergency findings can force a clinic to the top.

pub mod config;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod llm;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod rules;
pub mod scoring;

pub use config::Config;
pub use engine::{AssessRequest, EngineSettings, TriageEngine, TriageService};
pub use error::{AppError, Result};
pub use models::{FusedRecommendation, UrgencyTier};
