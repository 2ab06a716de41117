//! Normalized build unit model

use std::path::PathBuf;

/// One independently buildable container image.
///
/// Produced by the manifest loader with all defaults applied: the
/// dockerfile path is resolved under the build context and every tag is
/// fully qualified (`namespace/name:tag`). Immutable for the life of a
/// run; the scheduler owns the list and executors only borrow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildUnit {
    /// Unique name identifying the unit within the manifest.
    pub name: String,
    /// Build context directory passed to `docker build`.
    pub context: PathBuf,
    /// Dockerfile path, already resolved relative to the context.
    pub dockerfile: PathBuf,
    /// Fully qualified tags, in manifest order.
    pub tags: Vec<String>,
    /// `KEY=value` build arguments, in manifest order.
    pub build_args: Vec<String>,
}
