/// Urgency scoring from text or imaging findings

pub mod emergency;
pub mod imaging;

pub use emergency::{EmergencyScorer, DEFAULT_EMERGENCY_INCREMENT};
pub use imaging::{score_image, ImageAnalyzer};
