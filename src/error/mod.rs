//! Error handling for the health-insight pipelines.

pub mod util;

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Which pipeline an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    /// Symptom text to condition classifier
    Symptom,
    /// Structured feature risk predictor
    Risk,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symptom => write!(f, "symptom classifier"),
            Self::Risk => write!(f, "risk predictor"),
        }
    }
}

/// A single feature value that could not be coerced to its declared type
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MalformedField {
    /// Raw record key
    pub field: String,
    /// What the schema expected (e.g. "number", "flag", "category")
    pub expected: &'static str,
    /// Short rendering of the value that was supplied
    pub found: String,
}

impl fmt::Display for MalformedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}",
            self.field, self.expected, self.found
        )
    }
}

/// Specialized error type for the health-insight pipelines
#[derive(Debug, thiserror::Error)]
pub enum HealthInsightError {
    /// Inference or save attempted on a pipeline that holds no trained state
    #[error("{pipeline} is not trained; train or load it first")]
    NotTrained { pipeline: PipelineKind },

    /// Training data cannot support a multi-class model
    #[error("Insufficient training data: {reason}")]
    InsufficientData { reason: String },

    /// No artifact exists at the requested location
    #[error("Model artifact not found: {}", .path.display())]
    ArtifactNotFound { path: PathBuf },

    /// One or more supplied feature values have the wrong type
    #[error("Malformed feature record: {}", format_fields(.fields))]
    MalformedFeature { fields: Vec<MalformedField> },

    /// A feature vector does not carry the training-time feature ordering
    #[error("Feature mismatch: expected {expected:?}, found {found:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// An artifact exists but cannot be restored as a complete trained bundle
    #[error("Corrupt model artifact {}: {reason}", .path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    /// Configuration value could not be interpreted
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error opening, reading or writing a file
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Error encoding or decoding JSON data
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HealthInsightError {
    /// Create an IO error with context describing the failed operation
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an insufficient data error
    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }

    /// Create a corrupt artifact error
    pub fn corrupt_artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

fn format_fields(fields: &[MalformedField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for health-insight operations
pub type Result<T> = std::result::Result<T, HealthInsightError>;
