//! End-to-end pipelines and their coordinator
//!
//! * `symptom` - free text to condition label
//! * `risk` - structured record to risk tier, rule scores and advice
//! * `synthetic` - seeded training data for both
//! * `context` - owning coordinator guarding both pipelines

pub mod context;
pub mod risk;
pub mod symptom;
pub mod synthetic;

pub use context::{InitOutcome, InitStrategy, InitSummary, PipelineContext};
pub use risk::{RiskPredictor, RiskTrainingReport, TrainedRiskModel};
pub use symptom::{SymptomClassifier, TextTrainingReport, TrainedTextModel};
