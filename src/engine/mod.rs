/// Triage pipeline composition and lifecycle
///
/// `TriageEngine` runs normalization, classification, rule extraction,
/// scoring and fusion over one immutable artifact set. `TriageService`
/// loads that set once and hands out the engine.

pub mod request;
pub mod service;
pub mod triage;

pub use request::{check_text, AssessRequest, MAX_TEXT_LEN};
pub use service::TriageService;
pub use triage::{EngineSettings, TriageEngine};
