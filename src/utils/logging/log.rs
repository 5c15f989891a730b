//! Log lines for artifact I/O and degraded training inputs

use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Direction of an artifact transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactIo {
    Save,
    Load,
}

impl fmt::Display for ArtifactIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Save => "Saving",
            Self::Load => "Loading",
        })
    }
}

/// Announce a save or load of a `kind` artifact
pub fn log_artifact_start(io: ArtifactIo, kind: &str, path: &Path) {
    log::info!("{io} {kind} artifact at {}", path.display());
}

/// Record a finished transfer with its size and duration
pub fn log_artifact_complete(io: ArtifactIo, kind: &str, path: &Path, bytes: usize, elapsed: Duration) {
    let verb = match io {
        ArtifactIo::Save => "Wrote",
        ArtifactIo::Load => "Read",
    };
    log::info!("{verb} {kind} artifact ({bytes} bytes) at {} in {elapsed:?}", path.display());
}

/// Warn that a feature had no training values and was given `fallback`
pub fn log_feature_fallback(feature: &str, fallback: f64) {
    log::warn!("Feature {feature} has no training values; imputing {fallback}");
}
