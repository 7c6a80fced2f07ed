//! Persistence for the calibrated decision threshold.
//!
//! The threshold is computed once per training run, written as a small
//! JSON record, and read back by the decision service at startup. It is
//! read-only for the lifetime of a deployed model version.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Persisted threshold record. One floating-point field under the key
/// `"threshold"`, matching what every deployed decision service expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdArtifact {
    pub threshold: f64,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed artifact: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Storage abstraction for threshold artifacts.
///
/// Callers decide what to do when loading fails; the store itself never
/// substitutes defaults.
pub trait ArtifactStore: Send + Sync {
    fn save_threshold(&self, artifact: &ThresholdArtifact) -> Result<(), ArtifactError>;
    fn load_threshold(&self) -> Result<ThresholdArtifact, ArtifactError>;
}

/// Filesystem-backed store writing JSON to a configured path.
pub struct FsArtifactStore {
    path: PathBuf,
}

impl FsArtifactStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save_threshold(&self, artifact: &ThresholdArtifact) -> Result<(), ArtifactError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(artifact)?;
        fs::write(&self.path, json)?;
        info!(
            path = %self.path.display(),
            threshold = artifact.threshold,
            "Saved threshold artifact"
        );
        Ok(())
    }

    fn load_threshold(&self) -> Result<ThresholdArtifact, ArtifactError> {
        if !self.path.exists() {
            return Err(ArtifactError::NotFound(self.path.clone()));
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Load the threshold, falling back to `default` when no artifact exists.
///
/// Used by the decision service at startup; a malformed artifact is still
/// an error, only absence falls back.
pub fn load_threshold_or(
    store: &dyn ArtifactStore,
    default: f64,
) -> Result<f64, ArtifactError> {
    match store.load_threshold() {
        Ok(artifact) => Ok(artifact.threshold),
        Err(ArtifactError::NotFound(path)) => {
            info!(
                path = %path.display(),
                default = default,
                "No threshold artifact, using default"
            );
            Ok(default)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("threshold.json"));

        let artifact = ThresholdArtifact {
            threshold: 0.417_346_938_775_510_2,
        };
        store.save_threshold(&artifact).unwrap();

        let loaded = store.load_threshold().unwrap();
        assert!((loaded.threshold - artifact.threshold).abs() < 1e-9);
    }

    #[test]
    fn test_wire_format_uses_threshold_key() {
        let json = serde_json::to_string(&ThresholdArtifact { threshold: 0.6 }).unwrap();
        assert_eq!(json, r#"{"threshold":0.6}"#);

        let parsed: ThresholdArtifact = serde_json::from_str(r#"{"threshold": 0.55}"#).unwrap();
        assert_eq!(parsed.threshold, 0.55);
    }

    #[test]
    fn test_missing_artifact_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("absent.json"));

        assert!(matches!(
            store.load_threshold(),
            Err(ArtifactError::NotFound(_))
        ));
        assert_eq!(load_threshold_or(&store, 0.5).unwrap(), 0.5);
    }

    #[test]
    fn test_malformed_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threshold.json");
        fs::write(&path, "not json").unwrap();

        let store = FsArtifactStore::new(path);
        assert!(matches!(
            store.load_threshold(),
            Err(ArtifactError::Malformed(_))
        ));
        // Malformed must not silently fall back.
        assert!(load_threshold_or(&store, 0.5).is_err());
    }
}
