use slipway_core::BuildUnit;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

/// A stand-in docker binary: logs every invocation to a file, then runs
/// a caller-supplied shell snippet which may inspect `$@` and exit
/// nonzero.
pub struct StubDocker {
    #[allow(dead_code)]
    dir: TempDir,
    pub bin: PathBuf,
    log: PathBuf,
}

impl StubDocker {
    pub fn new(behavior: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("invocations.log");
        let bin = dir.path().join("docker");

        let script = format!(
            "#!/bin/sh\necho \"$@\" >> \"{}\"\n{}\nexit 0\n",
            log.display(),
            behavior
        );
        fs::write(&bin, script).unwrap();
        let mut perms = fs::metadata(&bin).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&bin, perms).unwrap();

        Self { dir, bin, log }
    }

    /// Always-succeeding stub.
    pub fn ok() -> Self {
        Self::new("")
    }

    /// Recorded invocations, one argv line per subprocess, in start
    /// order.
    pub fn invocations(&self) -> Vec<String> {
        if !self.log.exists() {
            return Vec::new();
        }
        fs::read_to_string(&self.log)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

pub fn unit(name: &str) -> BuildUnit {
    unit_with_tags(name, &["latest"])
}

pub fn unit_with_tags(name: &str, tags: &[&str]) -> BuildUnit {
    BuildUnit {
        name: name.to_string(),
        context: PathBuf::from(name),
        dockerfile: PathBuf::from(format!("{}/Dockerfile", name)),
        tags: tags.iter().map(|tag| format!("{}:{}", name, tag)).collect(),
        build_args: Vec::new(),
    }
}
