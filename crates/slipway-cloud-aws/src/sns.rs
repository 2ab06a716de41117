//! aws sns CLI wrapper

use crate::cli::aws_bin;
use crate::error::{AwsError, Result};
use std::process::Stdio;
use tokio::process::Command;

/// aws sns CLI wrapper, scoped to one topic.
pub struct SnsCli {
    topic_arn: String,
    bin: String,
}

impl SnsCli {
    pub fn new(topic_arn: impl Into<String>) -> Self {
        Self {
            topic_arn: topic_arn.into(),
            bin: aws_bin(),
        }
    }

    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    /// Publish a notification to the topic.
    pub async fn publish(&self, subject: &str, message: &str) -> Result<()> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["sns", "publish", "--topic-arn"]);
        cmd.arg(&self.topic_arn);
        cmd.args(["--subject", subject, "--message", message]);
        cmd.args(["--output", "json"]);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: aws sns publish --topic-arn {}", self.topic_arn);

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AwsError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(())
    }
}
