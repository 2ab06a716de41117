//! GitHub backup error types

use slipway_cloud_aws::AwsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GithubError {
    #[error("gh CLI not found. Please install the GitHub CLI and run 'gh auth login'")]
    GhCliNotFound,

    #[error("gh command failed: {0}")]
    CommandFailed(String),

    #[error("Migration {0} has failed")]
    MigrationFailed(u64),

    #[error(
        "Daily retention must be at least {minimum} days for monthly backups to work, got {requested}"
    )]
    RetentionTooShort { requested: u32, minimum: u32 },

    #[error("No backups found to evaluate")]
    NoBackupsFound,

    #[error(transparent)]
    Aws(#[from] AwsError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GithubError>;
