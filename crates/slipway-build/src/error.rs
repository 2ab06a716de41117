//! Build orchestration error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to poll '{program}': {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to install signal handler: {0}")]
    Signal(std::io::Error),
}

pub type Result<T> = std::result::Result<T, BuildError>;
