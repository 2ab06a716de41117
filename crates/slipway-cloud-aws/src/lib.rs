//! AWS workflows driven through the aws CLI
//!
//! Sequential environment plumbing, independent of the build
//! orchestrator: Aurora cluster lifecycle (delete a cluster instances
//! first, restore a cluster to a point in time, look up a cluster
//! endpoint) plus the S3 object and SNS notification operations the
//! backup workflows sit on. Everything goes through the `aws` CLI
//! with JSON output.

pub mod aurora;
pub mod cli;
pub mod error;
pub mod s3;
pub mod sns;

pub use aurora::{AuroraLifecycle, DEFAULT_INSTANCE_CLASS, RestoreSpec};
pub use cli::{AWS_BIN_ENV, ClusterInfo, ClusterMember, InstanceInfo, RdsCli};
pub use error::{AwsError, Result};
pub use s3::S3Cli;
pub use sns::SnsCli;
