//! aws s3api CLI wrapper
//!
//! Wraps the S3 object operations used by the backup workflows. Every
//! call is scoped to one bucket and requests JSON output.

use crate::cli::aws_bin;
use crate::error::{AwsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// aws s3api CLI wrapper, scoped to one bucket.
pub struct S3Cli {
    bucket: String,
    bin: String,
}

impl S3Cli {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            bin: aws_bin(),
        }
    }

    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    /// Run an `aws s3api` subcommand and return stdout.
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("s3api");
        cmd.args(args);
        cmd.arg("--bucket").arg(&self.bucket);
        cmd.args(["--output", "json"]);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(
            "Running: aws s3api {} --bucket {} --output json",
            args.join(" "),
            self.bucket
        );

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AwsError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// List every key under a prefix, following pagination.
    pub async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut args = vec!["list-objects-v2"];
            if !prefix.is_empty() {
                args.extend(["--prefix", prefix]);
            }
            if let Some(token) = &continuation {
                args.extend(["--continuation-token", token.as_str()]);
            }

            let output = self.run_command(&args).await?;
            // An empty bucket produces no output at all.
            if output.trim().is_empty() {
                break;
            }

            let page: ListObjectsResponse = serde_json::from_str(&output)?;
            keys.extend(page.contents.into_iter().map(|object| object.key));

            match page.next_continuation_token {
                Some(token) if page.is_truncated => continuation = Some(token),
                _ => break,
            }
        }

        Ok(keys)
    }

    /// An object's tags as a map.
    pub async fn object_tags(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let output = self
            .run_command(&["get-object-tagging", "--key", key])
            .await?;
        let response: TaggingDocument = serde_json::from_str(&output)?;
        Ok(response
            .tag_set
            .into_iter()
            .map(|tag| (tag.key, tag.value))
            .collect())
    }

    /// Replace an object's tags.
    pub async fn put_object_tags(&self, key: &str, tags: &BTreeMap<String, String>) -> Result<()> {
        let document = TaggingDocument {
            tag_set: tags
                .iter()
                .map(|(key, value)| S3Tag {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        };
        let tagging = serde_json::to_string(&document)?;
        self.run_command(&["put-object-tagging", "--key", key, "--tagging", &tagging])
            .await?;
        Ok(())
    }

    pub async fn delete_object(&self, key: &str) -> Result<()> {
        self.run_command(&["delete-object", "--key", key]).await?;
        Ok(())
    }

    /// Upload a local file, tagging it in the same call.
    pub async fn upload_file(
        &self,
        path: &Path,
        key: &str,
        tags: &BTreeMap<String, String>,
        content_type: &str,
    ) -> Result<()> {
        let body = path.to_string_lossy().to_string();
        // put-object takes its tags as a query string, not a TagSet
        // document.
        let tagging = query_encode(tags);
        self.run_command(&[
            "put-object",
            "--key",
            key,
            "--body",
            &body,
            "--content-type",
            content_type,
            "--tagging",
            &tagging,
        ])
        .await?;
        Ok(())
    }
}

fn query_encode(tags: &BTreeMap<String, String>) -> String {
    tags.iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug, Clone, Deserialize)]
struct ListObjectsResponse {
    #[serde(rename = "Contents", default)]
    contents: Vec<S3Object>,

    #[serde(rename = "IsTruncated", default)]
    is_truncated: bool,

    #[serde(rename = "NextContinuationToken")]
    next_continuation_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct S3Object {
    #[serde(rename = "Key")]
    key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaggingDocument {
    #[serde(rename = "TagSet", default)]
    tag_set: Vec<S3Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct S3Tag {
    #[serde(rename = "Key")]
    key: String,

    #[serde(rename = "Value")]
    value: String,
}
