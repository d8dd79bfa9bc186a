use std::path::PathBuf;

use thiserror::Error;

/// Recoverable failure to fetch or decode a panorama image. The session
/// stays where it was and the caller is expected to notify the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load panorama {image}: {reason}")]
pub struct LoadFailure {
    pub image: String,
    pub reason: String,
}

impl LoadFailure {
    pub fn new(image: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tour config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse tour config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("availablePanoramas must list at least one image")]
    NoPanoramas,
    #[error("floor {0} is configured more than once")]
    DuplicateFloor(&'static str),
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read floor manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse floor manifest: {0}")]
    Parse(#[from] serde_json::Error),
}
