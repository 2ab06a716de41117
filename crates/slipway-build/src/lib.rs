//! Slipway build orchestration
//!
//! This crate drives `docker build` and `docker push` for every unit in
//! a manifest, sequentially or with a bounded pool of concurrent
//! workers. A run is fail-fast: the first nonzero subprocess exit (or an
//! operator signal) flips a shared cancellation token, in-flight
//! subprocesses are killed at their next poll tick, and no new work is
//! started. The first recorded failure code becomes the process exit
//! code.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │               scheduler::run                │
//! │   sequential loop │ bounded JoinSet pool    │
//! │        (signals → CancelToken, parallel)    │
//! └──────────┬─────────────────────────────────┘
//!            │ one call per unit
//! ┌──────────▼─────────────────────────────────┐
//! │          executor::execute_unit             │
//! │   docker build, then docker push per tag    │
//! └──────────┬─────────────────────────────────┘
//!            │ one subprocess at a time
//! ┌──────────▼─────────────────────────────────┐
//! │            runner::ProcessRunner            │
//! │   spawn, poll try_wait, kill on cancel      │
//! └────────────────────────────────────────────┘
//! ```

pub mod cancel;
pub mod error;
pub mod executor;
pub mod runner;
pub mod scheduler;

pub use cancel::CancelToken;
pub use error::{BuildError, Result};
pub use executor::execute_unit;
pub use runner::{ProcessRunner, RunStatus};
pub use scheduler::{RunConfig, run, run_with_token};
