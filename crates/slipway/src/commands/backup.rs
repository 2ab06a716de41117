use colored::Colorize;
use slipway_cloud_github::{BackupConfig, OrgBackup};

/// Handle `slipway backup`: archive the organisation's repositories to
/// S3 and prune the backup set.
pub async fn handle(config: BackupConfig) -> anyhow::Result<()> {
    println!(
        "Backing up organisation {} to {}",
        config.organisation.cyan(),
        config.s3_bucket.cyan()
    );

    let mut backup = OrgBackup::new(config);
    backup.run().await?;

    println!("{}", "Backup complete".green());
    Ok(())
}
