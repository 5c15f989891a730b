//! Symptom-to-condition text classification and structured health-risk
//! prediction, with deterministic rule-based risk scoring and
//! recommendations alongside the learned models.

// Lets `#[derive(FeatureSchema)]` expand to `::health_insight::...` inside
// this crate as well.
extern crate self as health_insight;

pub mod artifact;
pub mod config;
pub mod error;
pub mod features;
pub mod ml;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod text;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::HealthInsightConfig;
pub use error::{HealthInsightError, Result};

// Schemas and records
pub use features::{FeaturePreparer, FeatureSchema, FeatureVector, HealthRecord, RawRecord, RawValue};
pub use macros::FeatureSchema;

// Results
pub use models::{PredictionResult, RiskCategory, RiskPredictionResult, RiskProfile, RiskTier};

// Pipelines
pub use artifact::ModelArtifactStore;
pub use pipeline::{InitStrategy, PipelineContext, RiskPredictor, SymptomClassifier};
pub use scoring::{RecommendationGenerator, RuleBasedRiskScorer};
