//! Run scheduling: sequential loop or bounded worker pool
//!
//! Sequential mode guarantees manifest order and stops dispatching at
//! the first failure. Parallel mode admits every selected unit into a
//! `JoinSet` gated by a semaphore of `parallel` slots; admission checks
//! the cancellation token, and already-admitted units are never
//! force-aborted except through their own subprocess being killed.
//! Termination signals are wired to the token in parallel mode only:
//! the sequential loop observes cancellation at every unit boundary,
//! while parallel workers would otherwise never see a signal arriving
//! while all of them are blocked polling subprocesses.

use crate::cancel::CancelToken;
use crate::error::{BuildError, Result};
use crate::executor::execute_unit;
use crate::runner::DEFAULT_POLL_INTERVAL;
use slipway_core::BuildUnit;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Environment variable overriding the docker binary (e.g. `podman`).
pub const DOCKER_BIN_ENV: &str = "SLIPWAY_DOCKER";

/// Read-only configuration for one run, built from the CLI invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Push every tag after a successful build.
    pub push: bool,
    /// Discard docker output instead of inheriting it.
    pub silent: bool,
    /// Bounded worker count; `None` runs sequentially.
    pub parallel: Option<usize>,
    /// Restrict the run to a single unit by name.
    pub only: Option<String>,
    /// Binary invoked for build and push.
    pub docker_bin: String,
    /// Subprocess poll cadence.
    pub poll_interval: Duration,
}

impl RunConfig {
    /// Build a run configuration, applying the filter-wins rule: a
    /// single-unit filter disables parallelism. Announcing the dropped
    /// parallelism to the operator is the caller's job.
    pub fn new(push: bool, silent: bool, parallel: Option<usize>, only: Option<String>) -> Self {
        let parallel = if only.is_some() { None } else { parallel };

        Self {
            push,
            silent,
            parallel,
            only,
            docker_bin: std::env::var(DOCKER_BIN_ENV).unwrap_or_else(|_| "docker".to_string()),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_docker_bin(mut self, docker_bin: impl Into<String>) -> Self {
        self.docker_bin = docker_bin.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Run every selected unit and return the process exit code: the first
/// recorded failure code, or 0 on full success or clean cancellation.
pub async fn run(units: &[BuildUnit], config: &RunConfig) -> i32 {
    let token = CancelToken::new();
    run_with_token(units, config, &token).await
}

/// [`run`] against a caller-supplied cancellation token.
pub async fn run_with_token(units: &[BuildUnit], config: &RunConfig, token: &CancelToken) -> i32 {
    let selected: Vec<&BuildUnit> = match &config.only {
        Some(name) => units.iter().filter(|u| &u.name == name).collect(),
        None => units.iter().collect(),
    };

    match config.parallel {
        Some(count) => {
            if let Err(e) = run_parallel(&selected, config, token, count).await {
                error!(error = %e, "Parallel run aborted");
                token.request(Some(1));
            }
        }
        None => run_sequential(&selected, config, token).await,
    }

    token.exit_code().unwrap_or(0)
}

async fn run_sequential(units: &[&BuildUnit], config: &RunConfig, token: &CancelToken) {
    for unit in units {
        if token.is_cancelled() {
            debug!("Cancelled, not dispatching further units");
            return;
        }

        if !execute_unit(unit, config, token).await {
            error!(unit = %unit.name, "Build for container failed, stopping run");
            return;
        }
    }
}

async fn run_parallel(
    units: &[&BuildUnit],
    config: &RunConfig,
    token: &CancelToken,
    count: usize,
) -> Result<()> {
    info!(workers = count, "Running builds in parallel");

    let signals = spawn_signal_listener(token.clone())?;
    let slots = Arc::new(Semaphore::new(count.max(1)));
    let mut pool = JoinSet::new();

    for unit in units {
        if token.is_cancelled() {
            debug!("Cancelled, not admitting further units");
            break;
        }

        let slots = Arc::clone(&slots);
        let config = config.clone();
        let token = token.clone();
        let unit = (*unit).clone();
        pool.spawn(async move {
            let _slot = match slots.acquire_owned().await {
                Ok(slot) => slot,
                // The semaphore is never closed; treat it as a skip.
                Err(_) => return,
            };
            execute_unit(&unit, &config, &token).await;
        });
    }

    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Worker task panicked");
            token.request(Some(1));
        }
    }

    signals.abort();
    Ok(())
}

/// Translate SIGINT/SIGTERM/SIGQUIT into a clean cancellation request.
fn spawn_signal_listener(token: CancelToken) -> Result<tokio::task::JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt()).map_err(BuildError::Signal)?;
    let mut terminate = signal(SignalKind::terminate()).map_err(BuildError::Signal)?;
    let mut quit = signal(SignalKind::quit()).map_err(BuildError::Signal)?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = quit.recv() => "SIGQUIT",
        };
        info!(signal = name, "Received termination signal, stopping run");
        token.request(None);
    }))
}
