//! Utility functions for error handling
//!
//! This module provides file helpers that translate IO failures into the
//! crate's error taxonomy.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{HealthInsightError, Result};

/// Open an artifact file for reading with rich error information
///
/// A missing path is reported as `ArtifactNotFound`; every other failure is
/// an IO error carrying the purpose of the read.
///
/// # Arguments
/// * `path` - The path to the artifact
/// * `purpose` - Why the file is being opened (for error context)
pub fn open_artifact_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(HealthInsightError::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }

    if !path.is_file() {
        return Err(HealthInsightError::io(
            format!("Expected a file for {purpose}: {}", path.display()),
            io::Error::new(io::ErrorKind::InvalidInput, "path is not a file"),
        ));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => {
                format!("Permission denied opening {}", path.display())
            }
            io::ErrorKind::NotFound => {
                return HealthInsightError::ArtifactNotFound {
                    path: path.to_path_buf(),
                };
            }
            _ => format!("Failed to open {} for {purpose}", path.display()),
        };
        HealthInsightError::io(context, e)
    })
}

/// Make sure the parent directory of `path` exists, creating it as needed
///
/// # Returns
/// The parent directory (`.` for a bare file name)
pub fn ensure_parent_dir<'a>(path: &'a Path, purpose: &str) -> Result<&'a Path> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if parent.exists() && !parent.is_dir() {
        return Err(HealthInsightError::io(
            format!("Expected a directory for {purpose}: {}", parent.display()),
            io::Error::new(io::ErrorKind::InvalidInput, "path is not a directory"),
        ));
    }

    fs::create_dir_all(parent).map_err(|e| {
        HealthInsightError::io(
            format!("Failed to create {} for {purpose}", parent.display()),
            e,
        )
    })?;

    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let err = open_artifact_file(&path, "test").unwrap_err();
        assert!(matches!(err, HealthInsightError::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_ensure_parent_dir_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("model.json");

        let parent = ensure_parent_dir(&path, "test").unwrap();
        assert!(parent.is_dir());
        assert_eq!(parent, dir.path().join("a").join("b"));
    }
}
