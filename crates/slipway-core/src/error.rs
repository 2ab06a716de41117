//! Manifest error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not readable: {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Manifest parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Duplicate container name in manifest: {0}")]
    DuplicateUnit(String),

    #[error("Container not found in manifest: {0}")]
    UnitNotFound(String),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
