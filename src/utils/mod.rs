//! Utility modules shared by the pipelines

pub mod logging;
