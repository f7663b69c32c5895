pub mod clinic;
pub mod finding;
pub mod prediction;
pub mod recommendation;
pub mod urgency;

pub use clinic::*;
pub use finding::*;
pub use prediction::*;
pub use recommendation::*;
pub use urgency::*;
