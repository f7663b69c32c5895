/// External LLM opinion
///
/// The LLM is an optional collaborator: it ranks clinics for a complaint and
/// its ranking is blended with the statistical one. Failures never fail an
/// assessment; the engine degrades to statistical-only.

pub mod client;
pub mod parse;

use crate::error::Result;
use crate::models::{ClinicCatalog, Prediction};
use async_trait::async_trait;

pub use client::ChatCompletionPredictor;
pub use parse::parse_rankings;

/// Trait for external clinic rankers
#[async_trait]
pub trait ExternalPredictor: Send + Sync {
    /// Get predictor name
    fn name(&self) -> &str;

    /// Rank catalog clinics for the raw complaint text
    async fn predict(&self, text: &str, catalog: &ClinicCatalog) -> Result<Prediction>;
}
