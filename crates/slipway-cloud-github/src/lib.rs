//! GitHub organisation backup workflows
//!
//! Archives GitHub organisation migrations to S3 on a daily cadence
//! and maintains daily and monthly retention windows over the backup
//! set. GitHub access goes through the gh CLI; storage and alert
//! notifications go through the aws CLI wrappers.

pub mod backup;
pub mod cli;
pub mod error;
pub mod retention;

pub use backup::{BackupConfig, OrgBackup};
pub use cli::{GH_BIN_ENV, GhCli, Migration, MigrationState};
pub use error::{GithubError, Result};
