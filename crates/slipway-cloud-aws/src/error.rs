//! AWS provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("aws CLI not found. Please install the AWS CLI and run 'aws configure'")]
    AwsCliNotFound,

    #[error("aws command failed: {0}")]
    CommandFailed(String),

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Cluster has no endpoint: {0}")]
    EndpointMissing(String),

    #[error("Timed out waiting for {resource} to become {state}")]
    WaitTimeout { resource: String, state: String },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AwsError>;
