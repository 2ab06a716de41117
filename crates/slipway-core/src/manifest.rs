//! Manifest loading and normalization
//!
//! Reads `slipway.yaml` and turns every raw container entry into a
//! [`BuildUnit`] with defaults applied:
//!
//! - `dockerfile` defaults to `Dockerfile` and is resolved under `path`
//! - `tags` defaults to a single `latest` tag
//! - every tag is qualified as `<namespace>/<name>:<tag>` (or
//!   `<name>:<tag>` when the manifest has no namespace)

use crate::error::{ManifestError, Result};
use crate::model::BuildUnit;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manifest filename looked up in the working directory by default.
pub const DEFAULT_MANIFEST_FILE: &str = "slipway.yaml";

#[derive(Debug, Deserialize)]
struct RawManifest {
    namespace: Option<String>,
    containers: Vec<RawContainer>,
}

#[derive(Debug, Deserialize)]
struct RawContainer {
    name: String,
    path: PathBuf,
    dockerfile: Option<String>,
    tags: Option<Vec<String>>,
    build_args: Option<Vec<String>>,
}

/// A loaded manifest: ordered build units, ready to schedule.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub units: Vec<BuildUnit>,
}

impl Manifest {
    /// Load and normalize a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading manifest: {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse manifest content from a string.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawManifest = serde_yaml::from_str(text)?;

        let mut seen = HashSet::new();
        let mut units = Vec::with_capacity(raw.containers.len());
        for container in raw.containers {
            if !seen.insert(container.name.clone()) {
                return Err(ManifestError::DuplicateUnit(container.name));
            }
            units.push(normalize(container, raw.namespace.as_deref()));
        }

        Ok(Self { units })
    }

    /// Look up a unit by name.
    pub fn get(&self, name: &str) -> Option<&BuildUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Look up a unit by name, failing if it is not in the manifest.
    pub fn require(&self, name: &str) -> Result<&BuildUnit> {
        self.get(name)
            .ok_or_else(|| ManifestError::UnitNotFound(name.to_string()))
    }
}

fn normalize(raw: RawContainer, namespace: Option<&str>) -> BuildUnit {
    let dockerfile = raw
        .path
        .join(raw.dockerfile.as_deref().unwrap_or("Dockerfile"));

    let tags = raw
        .tags
        .unwrap_or_else(|| vec!["latest".to_string()])
        .into_iter()
        .map(|tag| match namespace {
            Some(ns) => format!("{}/{}:{}", ns, raw.name, tag),
            None => format!("{}:{}", raw.name, tag),
        })
        .collect();

    BuildUnit {
        name: raw.name,
        context: raw.path,
        dockerfile,
        tags,
        build_args: raw.build_args.unwrap_or_default(),
    }
}
