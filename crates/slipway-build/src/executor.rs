//! Per-unit build and push lifecycle

use crate::cancel::CancelToken;
use crate::runner::{ProcessRunner, RunStatus};
use crate::scheduler::RunConfig;
use slipway_core::BuildUnit;
use tracing::{debug, error, info};

/// Construct the `docker build` argument vector for a unit.
pub fn build_command(unit: &BuildUnit) -> Vec<String> {
    let mut args = vec!["build".to_string(), "--pull".to_string()];
    args.extend(unit.tags.iter().map(|tag| format!("--tag={}", tag)));
    args.extend(unit.build_args.iter().map(|arg| format!("--build-arg={}", arg)));
    args.push(format!("--file={}", unit.dockerfile.display()));
    args.push(unit.context.display().to_string());
    args
}

/// Construct the `docker push` argument vector for one tag.
pub fn push_command(tag: &str) -> Vec<String> {
    vec!["push".to_string(), tag.to_string()]
}

/// Run the full lifecycle for one unit: build, then push every tag.
///
/// Returns `false` only when this unit itself failed. Skips and
/// cancellation-induced kills return `true`: a cancelled run must not
/// report newly-skipped units as failures. A genuine failure is
/// recorded on the token (first failure wins) before returning, so
/// sibling units and the scheduler's aggregation observe it.
pub async fn execute_unit(unit: &BuildUnit, config: &RunConfig, token: &CancelToken) -> bool {
    if token.is_cancelled() {
        debug!(unit = %unit.name, "Cancelled before start, skipping");
        return true;
    }

    info!(unit = %unit.name, tags = %unit.tags.join(","), "Building image");

    let runner = ProcessRunner::new(config.poll_interval);
    match runner
        .run(&config.docker_bin, &build_command(unit), config.silent, token)
        .await
    {
        Ok(RunStatus::Success) => {}
        Ok(RunStatus::Killed) => {
            debug!(unit = %unit.name, "Build stopped by cancellation");
            return true;
        }
        Ok(RunStatus::Failed(code)) => {
            error!(unit = %unit.name, code, "Build failed");
            token.request(Some(code));
            return false;
        }
        Err(e) => {
            error!(unit = %unit.name, error = %e, "Could not run build");
            token.request(Some(1));
            return false;
        }
    }

    if token.is_cancelled() {
        return true;
    }

    info!(unit = %unit.name, "Build complete");

    if config.push {
        info!(unit = %unit.name, "Pushing image to registry");
        for tag in &unit.tags {
            info!(unit = %unit.name, %tag, "Pushing tag");

            match runner
                .run(&config.docker_bin, &push_command(tag), config.silent, token)
                .await
            {
                Ok(RunStatus::Success) => {}
                Ok(RunStatus::Killed) => {
                    debug!(unit = %unit.name, %tag, "Push stopped by cancellation");
                    return true;
                }
                Ok(RunStatus::Failed(code)) => {
                    error!(unit = %unit.name, %tag, code, "Push failed");
                    token.request(Some(code));
                    return false;
                }
                Err(e) => {
                    error!(unit = %unit.name, %tag, error = %e, "Could not run push");
                    token.request(Some(1));
                    return false;
                }
            }

            info!(unit = %unit.name, %tag, "Push complete");
        }
    }

    true
}
