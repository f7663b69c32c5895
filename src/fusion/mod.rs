/// Fusion of statistical, rule-based and external predictor outputs

pub mod blend;
pub mod overrides;

pub use blend::{FusionWeights, ResultFusion};
pub use overrides::OverrideTable;
