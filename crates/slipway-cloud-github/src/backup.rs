//! GitHub organisation backup workflow
//!
//! Drives the GitHub migrations API through the gh CLI: wait out any
//! in-flight migrations, copy finished ones to S3, start a fresh
//! migration when today has no backup yet, then prune the backup set
//! against the retention windows.

use crate::cli::{GhCli, Migration, MigrationState};
use crate::error::{GithubError, Result};
use crate::retention::{self, TYPE_DAILY, TaggedBackup, tag};
use chrono::{NaiveDate, Utc};
use slipway_cloud_aws::{S3Cli, SnsCli};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Minimum daily retention; anything shorter could prune the backup
/// that is due to become the month's monthly backup.
const MIN_DAILY_RETENTION_DAYS: u32 = 30;

/// Cadence for "has the migration finished yet" polls.
const MIGRATION_WAIT_INTERVAL: Duration = Duration::from_secs(30);

/// Archives smaller than this are treated as partial exports and left
/// alone until the next run.
const MIN_ARCHIVE_BYTES: u64 = 1024 * 1024;

const ARCHIVE_CONTENT_TYPE: &str = "application/x-gzip";

/// Subject line for alert notifications.
const ALERT_SUBJECT: &str = "Github Organisation Backup Alert";

/// Backup destination and retention settings.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub organisation: String,
    pub s3_bucket: String,
    pub daily_retention_days: u32,
    pub monthly_retention_months: u32,
    pub sns_topic_arn: Option<String>,
}

/// One backup run over an organisation.
pub struct OrgBackup {
    gh: GhCli,
    s3: S3Cli,
    sns: Option<SnsCli>,
    config: BackupConfig,
    wait_interval: Duration,
    /// Migrations already copied (or skipped) during this run.
    evaluated: HashSet<u64>,
}

impl OrgBackup {
    pub fn new(config: BackupConfig) -> Self {
        Self {
            gh: GhCli::new(&config.organisation),
            s3: S3Cli::new(&config.s3_bucket),
            sns: config
                .sns_topic_arn
                .as_deref()
                .map(|arn| SnsCli::new(arn)),
            wait_interval: MIGRATION_WAIT_INTERVAL,
            evaluated: HashSet::new(),
            config,
        }
    }

    pub fn with_wait_interval(mut self, interval: Duration) -> Self {
        self.wait_interval = interval;
        self
    }

    pub fn with_clients(mut self, gh: GhCli, s3: S3Cli, sns: Option<SnsCli>) -> Self {
        self.gh = gh;
        self.s3 = s3;
        self.sns = sns;
        self
    }

    /// Run the backup end to end, publishing an alert if it fails.
    pub async fn run(&mut self) -> Result<()> {
        let result = self.execute().await;
        if let Err(e) = &result {
            self.alert(&format!("Error running backup: {e}")).await;
        }
        result
    }

    async fn execute(&mut self) -> Result<()> {
        if self.config.daily_retention_days < MIN_DAILY_RETENTION_DAYS {
            return Err(GithubError::RetentionTooShort {
                requested: self.config.daily_retention_days,
                minimum: MIN_DAILY_RETENTION_DAYS,
            });
        }

        info!(
            organisation = %self.config.organisation,
            bucket = %self.config.s3_bucket,
            daily_retention_days = self.config.daily_retention_days,
            monthly_retention_months = self.config.monthly_retention_months,
            "Beginning organisation backup"
        );
        match &self.config.sns_topic_arn {
            Some(arn) => info!(topic = %arn, "Alerts will be published to SNS"),
            None => info!("SNS topic not configured, alerts will only be logged"),
        }

        self.gh.check_cli().await?;

        let today = Utc::now().date_naive();
        let timestamp = today.format("%Y-%m-%d").to_string();

        // Finish whatever a previous run left behind before starting
        // more work.
        self.wait_for_migrations().await?;

        if self.backup_exists(&timestamp).await? {
            info!(timestamp = %timestamp, "A backup already exists for today, skipping migration create");
        } else {
            info!(timestamp = %timestamp, "No backup found for today, creating a migration");
            self.create_migration().await?;
            self.wait_for_migrations().await?;
        }

        self.cleanup(today).await?;

        info!("All operations complete");
        Ok(())
    }

    /// Whether any backup object exists for the given timestamp. Keys
    /// are `<timestamp>/<migration_id>.tar.gz`, so a prefix listing is
    /// the lookup.
    async fn backup_exists(&self, timestamp: &str) -> Result<bool> {
        let keys = self.s3.list_keys(&format!("{timestamp}/")).await?;
        Ok(!keys.is_empty())
    }

    /// Keep checking until no migration is in flight.
    async fn wait_for_migrations(&mut self) -> Result<()> {
        while self.check_migrations().await? {
            info!("Waiting for a migration to complete before checking again");
            sleep(self.wait_interval).await;
        }
        Ok(())
    }

    /// Evaluate the organisation's migrations once. Returns `true`
    /// while at least one migration is still exporting; finished
    /// migrations are copied to S3 and their archives deleted.
    async fn check_migrations(&mut self) -> Result<bool> {
        info!("Fetching migration list");
        let migrations = self.gh.list_migrations().await?;

        if migrations.is_empty() {
            info!("No running migrations were found");
            return Ok(false);
        }

        let mut finished = Vec::new();
        for migration in migrations {
            match migration.state {
                MigrationState::Pending | MigrationState::Exporting => {
                    info!(
                        migration = migration.id,
                        state = ?migration.state,
                        "Migration is still in progress"
                    );
                    return Ok(true);
                }
                MigrationState::Exported => {
                    if self.evaluated.contains(&migration.id) {
                        debug!(
                            migration = migration.id,
                            "Migration already evaluated in this run, skipping"
                        );
                    } else {
                        finished.push(migration);
                    }
                }
                MigrationState::Failed => {
                    return Err(GithubError::MigrationFailed(migration.id));
                }
                MigrationState::Unknown => {
                    self.alert(&format!(
                        "Unknown state for migration '{}', skipping",
                        migration.id
                    ))
                    .await;
                }
            }
        }

        for migration in finished {
            self.evaluated.insert(migration.id);
            self.archive_migration(&migration).await?;
        }

        Ok(false)
    }

    /// Copy one finished migration to S3 (unless it is already there)
    /// and delete the archive on GitHub's side.
    async fn archive_migration(&self, migration: &Migration) -> Result<()> {
        let timestamp = migration.created_on().to_string();

        if self.backup_exists(&timestamp).await? {
            info!(
                migration = migration.id,
                "Migration already exists on S3, skipping copy"
            );
        } else {
            let scratch = tempfile::tempdir()?;
            let archive = scratch.path().join(format!("{}.tar.gz", migration.id));

            info!(migration = migration.id, "Downloading migration archive");
            let size = self.gh.download_archive(migration.id, &archive).await?;

            if size < MIN_ARCHIVE_BYTES {
                warn!(
                    migration = migration.id,
                    size, "Archive is suspiciously small (<1MB), skipping, it may be being deleted"
                );
                return Ok(());
            }

            let key = format!("{timestamp}/{}.tar.gz", migration.id);
            info!(migration = migration.id, key = %key, size, "Copying migration to S3");

            let mut tags = BTreeMap::new();
            tags.insert(tag::MIGRATION_ID.to_string(), migration.id.to_string());
            tags.insert(tag::TIMESTAMP.to_string(), timestamp.clone());
            tags.insert(
                tag::MIGRATION_CREATED_AT.to_string(),
                migration.created_at.clone(),
            );
            tags.insert(
                tag::ORGANISATION.to_string(),
                self.config.organisation.clone(),
            );
            tags.insert(tag::TYPE.to_string(), TYPE_DAILY.to_string());

            self.s3
                .upload_file(&archive, &key, &tags, ARCHIVE_CONTENT_TYPE)
                .await?;
            info!(migration = migration.id, "Upload complete");
        }

        // Losing the delete only leaves an extra archive on GitHub's
        // side, not a backup gap.
        if let Err(e) = self.gh.delete_archive(migration.id).await {
            error!(
                migration = migration.id,
                error = %e,
                "Could not delete migration archive"
            );
        }

        Ok(())
    }

    /// Start a migration covering every repository the organisation
    /// owns.
    async fn create_migration(&self) -> Result<()> {
        let repositories = self.gh.list_repositories().await?;
        info!(
            repositories = repositories.len(),
            "Starting organisation migration"
        );
        let migration = self.gh.start_migration(&repositories).await?;
        info!(migration = migration.id, "Created migration");
        Ok(())
    }

    /// Prune stale backups and keep the monthly slot filled.
    async fn cleanup(&self, today: NaiveDate) -> Result<()> {
        info!("Cleaning up stale backups");

        let mut backups = Vec::new();
        for key in self.s3.list_keys("").await? {
            let tags = self.s3.object_tags(&key).await?;
            backups.push(TaggedBackup { key, tags });
        }

        let plan = retention::evaluate(
            &backups,
            today,
            self.config.daily_retention_days,
            self.config.monthly_retention_months,
        )?;

        for alert in &plan.alerts {
            self.alert(alert).await;
        }

        if let Some(promotion) = &plan.promotion {
            info!(key = %promotion.key, "Tagging daily backup as this month's monthly backup");
            self.s3
                .put_object_tags(&promotion.key, &promotion.tags)
                .await?;
        }

        for key in &plan.deletions {
            info!(key = %key, "Removing backup, retention period has been breached");
            self.s3.delete_object(key).await?;
        }

        info!(
            removed = plan.deletions.len(),
            promoted = plan.promotion.is_some(),
            "Backup cleaning completed"
        );
        Ok(())
    }

    /// Log an alert and publish it to the SNS topic when configured.
    async fn alert(&self, message: &str) {
        error!("{}", message);

        let Some(sns) = &self.sns else {
            return;
        };
        if let Err(e) = sns.publish(ALERT_SUBJECT, message).await {
            error!(error = %e, "Could not publish alert");
        }
    }
}
