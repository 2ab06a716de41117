//! Run-wide cooperative cancellation
//!
//! One [`CancelToken`] is shared by the scheduler, every unit executor
//! and the signal handler. Once cancelled it stays cancelled for the
//! rest of the run, and the first recorded failure code is the one the
//! run exits with.

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: bool,
    exit_code: Option<i32>,
}

/// Cheaply cloneable handle to the shared cancellation state.
///
/// A single lock guards both the flag and the recorded exit code, so a
/// worker discovering a failure and the signal handler requesting a
/// clean shutdown can never interleave their updates.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Mutex<CancelState>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation, optionally recording a failing exit code.
    ///
    /// Idempotent: the flag never reverts, and once an exit code is
    /// recorded later codes are ignored (first failure wins). Operator
    /// signals pass `None` so a clean shutdown does not count as a
    /// failure on its own.
    pub fn request(&self, exit_code: Option<i32>) {
        let mut state = self.inner.lock();
        state.cancelled = true;
        if state.exit_code.is_none() {
            state.exit_code = exit_code;
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().cancelled
    }

    /// The recorded failure code, if any unit failed.
    pub fn exit_code(&self) -> Option<i32> {
        self.inner.lock().exit_code
    }
}
