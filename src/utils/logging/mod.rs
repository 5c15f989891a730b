//! Logging utilities for output and progress tracking
//!
//! This module provides utilities for artifact logging and training progress.

pub mod log;
pub mod progress;

// Re-export commonly used functions for convenience
pub use self::log::{ArtifactIo, log_artifact_complete, log_artifact_start, log_feature_fallback};
pub use self::progress::{create_training_progress_bar, finish_progress_bar};
