//! Persistence of trained pipeline state
//!
//! Each pipeline persists one artifact: a JSON envelope carrying a format
//! marker, version, payload kind, creation time, the `is_trained` flag and
//! the complete learned-state bundle. Writes go to a temporary file in the
//! target directory which is then renamed over the destination, so a reader
//! sees either the previous artifact or the new one, never a partial file.
//! Loads validate the envelope and the payload's internal consistency before
//! anything is handed back.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};
use std::path::Path;
use std::time::Instant;

use crate::error::util::{ensure_parent_dir, open_artifact_file};
use crate::error::{HealthInsightError, Result};
use crate::utils::logging::{ArtifactIo, log_artifact_complete, log_artifact_start};

/// Marker identifying files written by this store
pub const ARTIFACT_FORMAT: &str = "health-insight-artifact";
/// Envelope layout version
pub const ARTIFACT_VERSION: u32 = 1;

/// A learned-state bundle that can be persisted as one unit
pub trait ArtifactPayload: Serialize + DeserializeOwned {
    /// Identifies the pipeline the payload belongs to
    const KIND: &'static str;

    /// Verify the restored parts agree with each other
    fn check_consistency(&self) -> std::result::Result<(), String>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    format: &'a str,
    version: u32,
    kind: &'a str,
    created_at: DateTime<Utc>,
    is_trained: bool,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    kind: String,
    created_at: DateTime<Utc>,
    is_trained: bool,
    payload: serde_json::Value,
}

/// Metadata of a loaded artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub kind: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
}

/// Stateless store reading and writing artifact files
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelArtifactStore;

impl ModelArtifactStore {
    /// Atomically write `payload` to `path`, creating parent directories
    ///
    /// # Returns
    /// The number of bytes written
    pub fn save<T: ArtifactPayload>(&self, payload: &T, path: &Path) -> Result<usize> {
        let start = Instant::now();
        log_artifact_start(ArtifactIo::Save, T::KIND, path);

        let envelope = EnvelopeRef {
            format: ARTIFACT_FORMAT,
            version: ARTIFACT_VERSION,
            kind: T::KIND,
            created_at: Utc::now(),
            is_trained: true,
            payload,
        };
        let bytes = serde_json::to_vec(&envelope)?;

        let parent = ensure_parent_dir(path, "model artifact")?;
        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
            HealthInsightError::io(
                format!("Failed to create temporary file in {}", parent.display()),
                e,
            )
        })?;
        temp.write_all(&bytes)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| {
                HealthInsightError::io(format!("Failed to write {}", temp.path().display()), e)
            })?;
        // A failed persist drops the temporary file; the destination is untouched.
        temp.persist(path).map_err(|e| {
            HealthInsightError::io(format!("Failed to replace {}", path.display()), e.error)
        })?;

        log_artifact_complete(ArtifactIo::Save, T::KIND, path, bytes.len(), start.elapsed());
        Ok(bytes.len())
    }

    /// Read and validate an artifact of kind `T::KIND`
    pub fn load<T: ArtifactPayload>(&self, path: &Path) -> Result<(T, ArtifactInfo)> {
        let start = Instant::now();
        log_artifact_start(ArtifactIo::Load, T::KIND, path);

        let file = open_artifact_file(path, "model artifact")?;
        let bytes = file.metadata().map_or(0, |m| m.len());
        let envelope: Envelope = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| HealthInsightError::corrupt_artifact(path, e.to_string()))?;

        if envelope.format != ARTIFACT_FORMAT {
            return Err(HealthInsightError::corrupt_artifact(
                path,
                format!("unknown format {:?}", envelope.format),
            ));
        }
        if envelope.version != ARTIFACT_VERSION {
            return Err(HealthInsightError::corrupt_artifact(
                path,
                format!(
                    "unsupported version {} (expected {ARTIFACT_VERSION})",
                    envelope.version
                ),
            ));
        }
        if envelope.kind != T::KIND {
            return Err(HealthInsightError::corrupt_artifact(
                path,
                format!("holds a {} artifact, expected {}", envelope.kind, T::KIND),
            ));
        }
        if !envelope.is_trained {
            return Err(HealthInsightError::corrupt_artifact(
                path,
                "artifact is not marked as trained",
            ));
        }

        let payload: T = serde_json::from_value(envelope.payload)
            .map_err(|e| HealthInsightError::corrupt_artifact(path, e.to_string()))?;
        payload
            .check_consistency()
            .map_err(|reason| HealthInsightError::corrupt_artifact(path, reason))?;

        log_artifact_complete(
            ArtifactIo::Load,
            T::KIND,
            path,
            usize::try_from(bytes).unwrap_or(usize::MAX),
            start.elapsed(),
        );
        Ok((
            payload,
            ArtifactInfo {
                kind: envelope.kind,
                version: envelope.version,
                created_at: envelope.created_at,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Weights {
        values: Vec<f64>,
    }

    impl ArtifactPayload for Weights {
        const KIND: &'static str = "weights";

        fn check_consistency(&self) -> std::result::Result<(), String> {
            if self.values.is_empty() {
                return Err("no weights".to_string());
            }
            Ok(())
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Other {
        values: Vec<f64>,
    }

    impl ArtifactPayload for Other {
        const KIND: &'static str = "other";

        fn check_consistency(&self) -> std::result::Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn test_round_trip_preserves_floats_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("weights.json");
        let weights = Weights {
            values: vec![0.1, 1.0 / 3.0, -2.5e-17, f64::MAX],
        };

        let written = ModelArtifactStore.save(&weights, &path).unwrap();
        assert!(written > 0);

        let (loaded, info): (Weights, _) = ModelArtifactStore.load(&path).unwrap();
        assert_eq!(loaded, weights);
        assert_eq!(info.kind, "weights");
        assert_eq!(info.version, ARTIFACT_VERSION);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifactStore
            .load::<Weights>(&dir.path().join("absent.json"))
            .unwrap_err();
        assert!(matches!(err, HealthInsightError::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_kind_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        ModelArtifactStore
            .save(&Other { values: vec![1.0] }, &path)
            .unwrap();

        let err = ModelArtifactStore.load::<Weights>(&path).unwrap_err();
        assert!(matches!(err, HealthInsightError::CorruptArtifact { .. }));
    }

    #[test]
    fn test_untrained_or_truncated_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        std::fs::write(
            &path,
            r#"{"format":"health-insight-artifact","version":1,"kind":"weights",
                "created_at":"2024-01-01T00:00:00Z","is_trained":false,"payload":{"values":[1.0]}}"#,
        )
        .unwrap();
        let err = ModelArtifactStore.load::<Weights>(&path).unwrap_err();
        assert!(matches!(err, HealthInsightError::CorruptArtifact { .. }));

        std::fs::write(&path, r#"{"format":"health-insight-artifact","vers"#).unwrap();
        let err = ModelArtifactStore.load::<Weights>(&path).unwrap_err();
        assert!(matches!(err, HealthInsightError::CorruptArtifact { .. }));
    }

    #[test]
    fn test_inconsistent_payload_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        ModelArtifactStore
            .save(&Weights { values: Vec::new() }, &path)
            .unwrap();

        let err = ModelArtifactStore.load::<Weights>(&path).unwrap_err();
        assert!(matches!(err, HealthInsightError::CorruptArtifact { .. }));
    }
}
