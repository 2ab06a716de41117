use colored::Colorize;
use slipway_cloud_aws::{AuroraLifecycle, RestoreSpec};

pub async fn handle_delete(cluster: &str, region: &str) -> anyhow::Result<()> {
    println!(
        "Deleting database cluster (region: {}): {}",
        region.cyan(),
        cluster.cyan()
    );

    let aurora = AuroraLifecycle::new(region);
    aurora.check_cli().await?;
    aurora.delete_cluster(cluster).await?;

    println!("{}", "Cluster deleted".green());
    Ok(())
}

pub async fn handle_restore(spec: &RestoreSpec, region: &str) -> anyhow::Result<()> {
    println!(
        "Restoring {} from {} (region: {})",
        spec.new_cluster.cyan(),
        spec.source_cluster.cyan(),
        region.cyan()
    );

    let aurora = AuroraLifecycle::new(region);
    aurora.check_cli().await?;
    aurora.restore_cluster(spec).await?;

    println!("{}", "Restore complete".green());
    Ok(())
}

pub async fn handle_endpoint(cluster: &str, region: &str) -> anyhow::Result<()> {
    let aurora = AuroraLifecycle::new(region);
    aurora.check_cli().await?;
    let endpoint = aurora.endpoint(cluster).await?;

    // Plain line so the output can be captured by scripts.
    println!("{}", endpoint);
    Ok(())
}
