//! gh CLI wrapper
//!
//! Wraps the GitHub CLI's `api` command for the organisation
//! migrations endpoints. Authentication is the gh CLI's business
//! (`GH_TOKEN` or a stored login).

use crate::error::{GithubError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Environment variable overriding the gh binary.
pub const GH_BIN_ENV: &str = "SLIPWAY_GH";

/// Header enabling the organisation migrations endpoints.
const MIGRATIONS_ACCEPT: &str = "Accept: application/vnd.github.wyandotte-preview+json";

/// gh CLI wrapper, scoped to one organisation.
pub struct GhCli {
    organisation: String,
    bin: String,
}

impl GhCli {
    pub fn new(organisation: impl Into<String>) -> Self {
        Self {
            organisation: organisation.into(),
            bin: std::env::var(GH_BIN_ENV).unwrap_or_else(|_| "gh".to_string()),
        }
    }

    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    /// Check that the gh CLI is installed.
    pub async fn check_cli(&self) -> Result<()> {
        let which = Command::new("which").arg(&self.bin).output().await?;

        if !which.status.success() {
            return Err(GithubError::GhCliNotFound);
        }

        Ok(())
    }

    /// Run a `gh api` call and return stdout.
    async fn run_api(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("api");
        cmd.args(["-H", MIGRATIONS_ACCEPT]);
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: gh api {}", args.join(" "));

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GithubError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// List the organisation's migrations with their current state.
    pub async fn list_migrations(&self) -> Result<Vec<Migration>> {
        let path = format!("/orgs/{}/migrations", self.organisation);
        let output = self.run_api(&[path.as_str()]).await?;
        Ok(serde_json::from_str(&output)?)
    }

    /// List every repository the organisation owns.
    pub async fn list_repositories(&self) -> Result<Vec<String>> {
        let path = format!("/orgs/{}/repos", self.organisation);
        let output = self
            .run_api(&["--paginate", "--jq", ".[].full_name", path.as_str()])
            .await?;
        Ok(output
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Start a migration covering the given repositories. Repositories
    /// stay unlocked so the backup never blocks development.
    pub async fn start_migration(&self, repositories: &[String]) -> Result<Migration> {
        let mut args: Vec<String> = vec![
            "-X".to_string(),
            "POST".to_string(),
            "-F".to_string(),
            "lock_repositories=false".to_string(),
        ];
        for repository in repositories {
            args.push("-f".to_string());
            args.push(format!("repositories[]={repository}"));
        }
        args.push(format!("/orgs/{}/migrations", self.organisation));

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.run_api(&arg_refs).await?;
        Ok(serde_json::from_str(&output)?)
    }

    /// Download a migration archive to a local file, following the
    /// redirect to the storage backend. Returns the archive size in
    /// bytes.
    pub async fn download_archive(&self, migration_id: u64, dest: &Path) -> Result<u64> {
        let path = format!(
            "/orgs/{}/migrations/{}/archive",
            self.organisation, migration_id
        );
        let file = std::fs::File::create(dest)?;

        let mut cmd = Command::new(&self.bin);
        cmd.arg("api");
        cmd.args(["-H", MIGRATIONS_ACCEPT]);
        cmd.arg(&path);
        cmd.stdout(Stdio::from(file));
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: gh api {}", path);

        // `Command::output()` would force stdout back to a pipe,
        // discarding the file redirect configured above.
        let output = cmd.spawn()?.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GithubError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(tokio::fs::metadata(dest).await?.len())
    }

    /// Delete a migration's archive on GitHub's side.
    pub async fn delete_archive(&self, migration_id: u64) -> Result<()> {
        let path = format!(
            "/orgs/{}/migrations/{}/archive",
            self.organisation, migration_id
        );
        self.run_api(&["-X", "DELETE", path.as_str()]).await?;
        Ok(())
    }
}

/// One organisation migration from the GitHub API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    pub id: u64,
    pub state: MigrationState,
    pub created_at: String,
}

impl Migration {
    /// Calendar date (`YYYY-MM-DD`) the migration was created on.
    pub fn created_on(&self) -> &str {
        self.created_at.get(..10).unwrap_or(&self.created_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    Pending,
    Exporting,
    Exported,
    Failed,
    #[serde(other)]
    Unknown,
}
