//! Progress reporting utilities for long-running operations
//!
//! This module provides standardized progress reporting for model training,
//! using the indicatif crate.

use indicatif::{ProgressBar, ProgressStyle};

/// Default style for a training progress bar
pub const DEFAULT_TRAINING_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}) {msg}";

/// Create a training progress bar with a standardized style
///
/// # Arguments
/// * `length` - Number of steps (trees or boosting stages)
/// * `description` - Optional description to display as the initial message
/// * `visible` - When false a hidden bar is returned, so callers never branch
///
/// # Returns
/// A configured `ProgressBar`
#[must_use]
pub fn create_training_progress_bar(
    length: u64,
    description: Option<&str>,
    visible: bool,
) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(length);
    // The template is a compile-time constant; fall back to the plain bar if
    // indicatif ever rejects it.
    let style = ProgressStyle::default_bar()
        .template(DEFAULT_TRAINING_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);

    if let Some(desc) = description {
        pb.set_message(desc.to_string());
    }

    pb
}

/// Finish a progress bar with a completion message
///
/// # Arguments
/// * `pb` - The `ProgressBar` to finish
/// * `message` - Optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}
