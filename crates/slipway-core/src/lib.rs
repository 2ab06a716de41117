//! Slipway manifest model and loader
//!
//! This crate owns the build manifest: the YAML file listing every
//! container image a project builds, and the normalized [`BuildUnit`]
//! records the rest of Slipway consumes.

pub mod error;
pub mod manifest;
pub mod model;

pub use error::{ManifestError, Result};
pub use manifest::{DEFAULT_MANIFEST_FILE, Manifest};
pub use model::BuildUnit;
