mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slipway")]
#[command(about = "Build and push container images from a manifest", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every container in the manifest, optionally pushing tags
    Build {
        /// Manifest file to load
        #[arg(long, default_value = slipway_core::DEFAULT_MANIFEST_FILE)]
        manifest: PathBuf,
        /// The number of builds to run in parallel.
        /// If not specified, builds will run sequentially
        #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(u16).range(1..))]
        parallel: Option<u16>,
        /// Build a specific container
        #[arg(long, value_name = "NAME")]
        container: Option<String>,
        /// Push built images
        #[arg(long)]
        push: bool,
        /// Hides docker build output
        #[arg(long)]
        silent: bool,
    },
    /// Aurora RDS cluster lifecycle
    Aurora {
        #[command(subcommand)]
        command: AuroraCommands,
    },
    /// Back up a GitHub organisation's repositories to S3
    Backup {
        /// GitHub organisation to back up
        #[arg(long, env = "ORGANISATION")]
        organisation: String,
        /// Destination S3 bucket
        #[arg(long, env = "S3_BUCKET")]
        s3_bucket: String,
        /// Days that daily backups are kept for
        #[arg(long, env = "DAILY_RETENTION", default_value_t = 60)]
        daily_retention: u32,
        /// Months that monthly backups are kept for
        #[arg(long, env = "MONTHLY_RETENTION", default_value_t = 12)]
        monthly_retention: u32,
        /// SNS topic that backup alerts are published to
        #[arg(long, env = "SNS_TOPIC_ARN")]
        sns_topic: Option<String>,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum AuroraCommands {
    /// Delete a cluster and all of its instances
    Delete {
        /// Aurora RDS cluster name
        cluster: String,
        /// AWS region that the cluster is located in
        region: String,
    },
    /// Restore a cluster from another cluster at a point in time
    Restore {
        /// Aurora RDS cluster to restore from
        source_cluster: String,
        /// Name for the new cluster
        new_cluster: String,
        /// AWS region that the source (and the target) cluster is located in
        region: String,
        /// Security group to use for the new cluster
        security_group: String,
        /// DB subnet group to use for the new cluster
        subnet_group: String,
        /// Cluster parameter group to use for the new cluster
        parameter_group: String,
        /// Point-in-time that the new cluster should be created from
        restore_time: String,
        /// Instance class to use for the new cluster
        #[arg(long, default_value = slipway_cloud_aws::DEFAULT_INSTANCE_CLASS)]
        instance_class: String,
    },
    /// Print a cluster's endpoint
    Endpoint {
        /// Aurora RDS cluster name
        cluster: String,
        /// AWS region that the cluster is located in
        region: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            manifest,
            parallel,
            container,
            push,
            silent,
        } => {
            let code =
                commands::build::handle(&manifest, parallel.map(usize::from), container, push, silent)
                    .await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Aurora { command } => match command {
            AuroraCommands::Delete { cluster, region } => {
                commands::aurora::handle_delete(&cluster, &region).await?;
            }
            AuroraCommands::Restore {
                source_cluster,
                new_cluster,
                region,
                security_group,
                subnet_group,
                parameter_group,
                restore_time,
                instance_class,
            } => {
                let spec = slipway_cloud_aws::RestoreSpec {
                    source_cluster,
                    new_cluster,
                    security_group,
                    subnet_group,
                    parameter_group,
                    restore_time,
                    instance_class,
                };
                commands::aurora::handle_restore(&spec, &region).await?;
            }
            AuroraCommands::Endpoint { cluster, region } => {
                commands::aurora::handle_endpoint(&cluster, &region).await?;
            }
        },
        Commands::Backup {
            organisation,
            s3_bucket,
            daily_retention,
            monthly_retention,
            sns_topic,
        } => {
            let config = slipway_cloud_github::BackupConfig {
                organisation,
                s3_bucket,
                daily_retention_days: daily_retention,
                monthly_retention_months: monthly_retention,
                sns_topic_arn: sns_topic,
            };
            commands::backup::handle(config).await?;
        }
        Commands::Version => {
            println!("slipway {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
