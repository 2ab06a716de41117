//! Subprocess supervision
//!
//! Runs one external process to completion while watching the shared
//! cancellation token. The wait is a `try_wait` poll loop rather than a
//! blocking wait: each worker owns exactly one child and has no
//! visibility into its siblings except through the token, so the poll
//! tick is the only place a sibling's failure (or an operator signal)
//! can be observed while a build is in flight.

use crate::cancel::CancelToken;
use crate::error::{BuildError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::debug;

/// How often a running subprocess is polled for completion.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of one supervised subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Exited with status 0.
    Success,
    /// Exited on its own with a nonzero status.
    Failed(i32),
    /// Killed because cancellation was requested. Benign: the process
    /// did not fail, the run stopped wanting its result.
    Killed,
}

/// Launches and polls external processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    poll_interval: Duration,
}

impl ProcessRunner {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Run `program` with `args` to completion.
    ///
    /// With `silent` the child's output is discarded; otherwise stdout
    /// and stderr are inherited so the operator sees live build output.
    /// The loop condition is "the process has not completed", never an
    /// exit-code test, so the wait cannot end before the child does.
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        silent: bool,
        token: &CancelToken,
    ) -> Result<RunStatus> {
        let mut cmd = Command::new(program);
        cmd.args(args);

        if silent {
            cmd.stdout(Stdio::null());
            cmd.stderr(Stdio::null());
        }

        debug!("Running: {} {}", program, args.join(" "));

        let mut child = cmd.spawn().map_err(|source| BuildError::Spawn {
            program: program.to_string(),
            source,
        })?;

        loop {
            if token.is_cancelled() {
                debug!("Cancellation requested, killing process");
                // The child may have exited between the check and the
                // kill; either way it is reaped below.
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Ok(RunStatus::Killed);
            }

            match child.try_wait().map_err(|source| BuildError::Wait {
                program: program.to_string(),
                source,
            })? {
                Some(status) => {
                    return Ok(match status.code() {
                        Some(0) => RunStatus::Success,
                        Some(code) => RunStatus::Failed(code),
                        // Terminated by a signal we did not send.
                        None => RunStatus::Failed(1),
                    });
                }
                None => sleep(self.poll_interval).await,
            }
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}
