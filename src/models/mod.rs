//! Domain models returned by the pipelines
//!
//! These are the result shapes handed to the request layer: the symptom
//! prediction, the risk prediction and the risk tier and category
//! vocabularies they are expressed in.

pub mod prediction;

// Re-export commonly used types
pub use prediction::{PredictionResult, RiskCategory, RiskPredictionResult, RiskProfile, RiskTier};
