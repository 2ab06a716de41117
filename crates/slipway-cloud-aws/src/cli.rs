//! aws CLI wrapper
//!
//! Wraps the `aws rds` CLI commands used by the Aurora workflows. Every
//! call is scoped to one region and requests JSON output.

use crate::error::{AwsError, Result};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;

/// Environment variable overriding the aws binary.
pub const AWS_BIN_ENV: &str = "SLIPWAY_AWS";

pub(crate) fn aws_bin() -> String {
    std::env::var(AWS_BIN_ENV).unwrap_or_else(|_| "aws".to_string())
}

/// aws CLI wrapper, scoped to one region.
pub struct RdsCli {
    region: String,
    bin: String,
}

impl RdsCli {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            bin: aws_bin(),
        }
    }

    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    /// Check that the aws CLI is installed.
    pub async fn check_cli(&self) -> Result<()> {
        let which = Command::new("which").arg(&self.bin).output().await?;

        if !which.status.success() {
            return Err(AwsError::AwsCliNotFound);
        }

        Ok(())
    }

    /// Run an `aws rds` subcommand and return stdout.
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("rds");
        cmd.args(args);
        cmd.arg("--region").arg(&self.region);
        cmd.args(["--output", "json"]);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(
            "Running: aws rds {} --region {} --output json",
            args.join(" "),
            self.region
        );

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AwsError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Describe one cluster. A missing cluster is `None`, not an error.
    pub async fn describe_cluster(&self, name: &str) -> Result<Option<ClusterInfo>> {
        let output = self
            .run_command(&["describe-db-clusters", "--db-cluster-identifier", name])
            .await;

        let output = match output {
            Ok(output) => output,
            Err(AwsError::CommandFailed(stderr)) if stderr.contains("DBClusterNotFound") => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let response: DescribeClustersResponse = serde_json::from_str(&output)?;
        Ok(response.clusters.into_iter().next())
    }

    /// Describe one instance. A missing instance is `None`.
    pub async fn describe_instance(&self, id: &str) -> Result<Option<InstanceInfo>> {
        let output = self
            .run_command(&["describe-db-instances", "--db-instance-identifier", id])
            .await;

        let output = match output {
            Ok(output) => output,
            Err(AwsError::CommandFailed(stderr)) if stderr.contains("DBInstanceNotFound") => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let response: DescribeInstancesResponse = serde_json::from_str(&output)?;
        Ok(response.instances.into_iter().next())
    }

    /// Delete an instance without a final snapshot.
    pub async fn delete_instance(&self, id: &str) -> Result<()> {
        self.run_command(&[
            "delete-db-instance",
            "--db-instance-identifier",
            id,
            "--skip-final-snapshot",
        ])
        .await?;
        Ok(())
    }

    /// Delete a cluster without a final snapshot.
    pub async fn delete_cluster(&self, name: &str) -> Result<()> {
        self.run_command(&[
            "delete-db-cluster",
            "--db-cluster-identifier",
            name,
            "--skip-final-snapshot",
        ])
        .await?;
        Ok(())
    }

    /// Restore a cluster from a source cluster to a point in time.
    pub async fn restore_cluster_to_point_in_time(
        &self,
        source: &str,
        target: &str,
        restore_time: &str,
        subnet_group: &str,
        security_group: &str,
        parameter_group: &str,
    ) -> Result<()> {
        self.run_command(&[
            "restore-db-cluster-to-point-in-time",
            "--db-cluster-identifier",
            target,
            "--restore-type",
            "full-copy",
            "--source-db-cluster-identifier",
            source,
            "--restore-to-time",
            restore_time,
            "--db-subnet-group-name",
            subnet_group,
            "--vpc-security-group-ids",
            security_group,
            "--db-cluster-parameter-group-name",
            parameter_group,
        ])
        .await?;
        Ok(())
    }

    /// Create an instance inside a cluster.
    pub async fn create_instance(
        &self,
        cluster: &str,
        instance_id: &str,
        engine: &str,
        instance_class: &str,
    ) -> Result<()> {
        self.run_command(&[
            "create-db-instance",
            "--db-cluster-identifier",
            cluster,
            "--db-instance-identifier",
            instance_id,
            "--engine",
            engine,
            "--db-instance-class",
            instance_class,
        ])
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DescribeClustersResponse {
    #[serde(rename = "DBClusters", default)]
    clusters: Vec<ClusterInfo>,
}

/// Cluster details from `describe-db-clusters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(rename = "DBClusterIdentifier")]
    pub id: String,

    #[serde(rename = "Status")]
    pub status: Option<String>,

    #[serde(rename = "Endpoint")]
    pub endpoint: Option<String>,

    #[serde(rename = "DBClusterMembers", default)]
    pub members: Vec<ClusterMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMember {
    #[serde(rename = "DBInstanceIdentifier")]
    pub instance_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DescribeInstancesResponse {
    #[serde(rename = "DBInstances", default)]
    instances: Vec<InstanceInfo>,
}

/// Instance details from `describe-db-instances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceInfo {
    #[serde(rename = "DBInstanceIdentifier")]
    pub id: String,

    #[serde(rename = "DBInstanceStatus")]
    pub status: Option<String>,
}

impl InstanceInfo {
    /// Whether the instance is ready to serve connections.
    pub fn is_available(&self) -> bool {
        self.status.as_deref() == Some("available")
    }
}
