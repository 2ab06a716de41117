//! Aurora cluster lifecycle workflows
//!
//! High-level delete/restore/endpoint operations composed from the
//! [`RdsCli`] wrapper. These mirror the classic snapshot-free staging
//! workflow: tear a cluster down instance-first, or rebuild one from a
//! production cluster at a point in time.

use crate::cli::RdsCli;
use crate::error::{AwsError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Instance class used for restored clusters unless overridden.
pub const DEFAULT_INSTANCE_CLASS: &str = "db.r4.large";

/// Engine for restored cluster instances.
const RESTORE_ENGINE: &str = "aurora-postgresql";

/// Cadence for "is it gone / is it ready yet" polls.
const WAIT_INTERVAL: Duration = Duration::from_secs(15);

/// Upper bound on availability polls for a freshly created instance.
/// Restores of large clusters routinely take the better part of an
/// hour.
const MAX_WAIT_ATTEMPTS: u32 = 180;

/// Parameters for restoring a cluster to a point in time.
#[derive(Debug, Clone)]
pub struct RestoreSpec {
    /// Cluster to restore from.
    pub source_cluster: String,
    /// Name for the restored cluster.
    pub new_cluster: String,
    /// Security group for the restored cluster.
    pub security_group: String,
    /// DB subnet group for the restored cluster.
    pub subnet_group: String,
    /// Cluster parameter group for the restored cluster.
    pub parameter_group: String,
    /// Point in time the restored cluster is created from.
    pub restore_time: String,
    /// Instance class for the restored cluster's primary instance.
    pub instance_class: String,
}

/// Aurora cluster lifecycle operations for one region.
pub struct AuroraLifecycle {
    cli: RdsCli,
    wait_interval: Duration,
    max_wait_attempts: u32,
}

impl AuroraLifecycle {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            cli: RdsCli::new(region),
            wait_interval: WAIT_INTERVAL,
            max_wait_attempts: MAX_WAIT_ATTEMPTS,
        }
    }

    pub fn with_wait_interval(mut self, interval: Duration) -> Self {
        self.wait_interval = interval;
        self
    }

    /// Check that the aws CLI is installed before starting a workflow.
    pub async fn check_cli(&self) -> Result<()> {
        self.cli.check_cli().await
    }

    /// Look up a cluster's endpoint.
    pub async fn endpoint(&self, cluster_name: &str) -> Result<String> {
        let cluster = self
            .cli
            .describe_cluster(cluster_name)
            .await?
            .ok_or_else(|| AwsError::ClusterNotFound(cluster_name.to_string()))?;

        cluster
            .endpoint
            .ok_or_else(|| AwsError::EndpointMissing(cluster_name.to_string()))
    }

    /// Delete a cluster and all of its instances.
    ///
    /// Instances are deleted first (the API refuses to drop a cluster
    /// with members), each waited out, then the cluster itself is
    /// deleted and polled until it no longer exists. A cluster that is
    /// already gone is success.
    pub async fn delete_cluster(&self, cluster_name: &str) -> Result<()> {
        info!(cluster = %cluster_name, "Deleting database cluster");

        let Some(cluster) = self.cli.describe_cluster(cluster_name).await? else {
            info!(cluster = %cluster_name, "Cluster not found, nothing to delete");
            return Ok(());
        };

        if !cluster.members.is_empty() {
            info!(
                cluster = %cluster_name,
                instances = cluster.members.len(),
                "Deleting cluster instance(s) first"
            );
        }

        for member in &cluster.members {
            self.cli.delete_instance(&member.instance_id).await?;
            info!(instance = %member.instance_id, "Waiting for instance to be deleted");
            self.wait_instance_deleted(&member.instance_id).await?;
        }

        if !cluster.members.is_empty() {
            info!(cluster = %cluster_name, "All instance(s) deleted, now deleting cluster");
        }

        self.cli.delete_cluster(cluster_name).await?;

        while self.cli.describe_cluster(cluster_name).await?.is_some() {
            info!(cluster = %cluster_name, "Waiting for cluster deletion");
            sleep(self.wait_interval).await;
        }

        info!(cluster = %cluster_name, "Cluster deleted");
        Ok(())
    }

    /// Restore a cluster to a point in time, replacing any existing
    /// cluster with the target name, and bring up its primary instance.
    pub async fn restore_cluster(&self, spec: &RestoreSpec) -> Result<()> {
        // The target name must be free before the restore can start.
        info!(cluster = %spec.new_cluster, "Deleting existing cluster if it exists");
        self.delete_cluster(&spec.new_cluster).await?;

        info!(
            cluster = %spec.new_cluster,
            source = %spec.source_cluster,
            restore_time = %spec.restore_time,
            "Creating new cluster"
        );
        self.cli
            .restore_cluster_to_point_in_time(
                &spec.source_cluster,
                &spec.new_cluster,
                &spec.restore_time,
                &spec.subnet_group,
                &spec.security_group,
                &spec.parameter_group,
            )
            .await?;

        let instance_id = format!("{}-primary", spec.new_cluster);
        info!(instance = %instance_id, "Creating instance within cluster");
        self.cli
            .create_instance(
                &spec.new_cluster,
                &instance_id,
                RESTORE_ENGINE,
                &spec.instance_class,
            )
            .await?;

        info!(instance = %instance_id, "Waiting for instance to be available");
        self.wait_instance_available(&instance_id).await?;

        info!(cluster = %spec.new_cluster, "Restore complete");
        Ok(())
    }

    async fn wait_instance_deleted(&self, instance_id: &str) -> Result<()> {
        for _ in 0..self.max_wait_attempts {
            if self.cli.describe_instance(instance_id).await?.is_none() {
                return Ok(());
            }
            sleep(self.wait_interval).await;
        }

        Err(AwsError::WaitTimeout {
            resource: instance_id.to_string(),
            state: "deleted".to_string(),
        })
    }

    async fn wait_instance_available(&self, instance_id: &str) -> Result<()> {
        for _ in 0..self.max_wait_attempts {
            if let Some(instance) = self.cli.describe_instance(instance_id).await? {
                if instance.is_available() {
                    return Ok(());
                }
            }
            sleep(self.wait_interval).await;
        }

        Err(AwsError::WaitTimeout {
            resource: instance_id.to_string(),
            state: "available".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_spec_defaults() {
        let spec = RestoreSpec {
            source_cluster: "prod-db".to_string(),
            new_cluster: "staging-db".to_string(),
            security_group: "sg-123".to_string(),
            subnet_group: "private-db".to_string(),
            parameter_group: "aurora-pg11".to_string(),
            restore_time: "2024-03-01T00:00:00Z".to_string(),
            instance_class: DEFAULT_INSTANCE_CLASS.to_string(),
        };
        assert_eq!(spec.instance_class, "db.r4.large");
    }
}
