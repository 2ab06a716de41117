use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch project: a manifest plus a stand-in docker binary that
/// logs its invocations.
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn write_manifest(&self, content: &str) -> PathBuf {
        let path = self.root.path().join("slipway.yaml");
        fs::write(&path, content).unwrap();
        path
    }

    /// Install a fake docker; `behavior` runs after the invocation is
    /// logged and may exit nonzero.
    pub fn write_stub_docker(&self, behavior: &str) -> PathBuf {
        let log = self.root.path().join("invocations.log");
        let bin = self.root.path().join("docker");
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> \"{}\"\n{}\nexit 0\n",
            log.display(),
            behavior
        );
        fs::write(&bin, script).unwrap();
        let mut perms = fs::metadata(&bin).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&bin, perms).unwrap();
        bin
    }

    pub fn invocations(&self) -> Vec<String> {
        let log = self.root.path().join("invocations.log");
        if !log.exists() {
            return Vec::new();
        }
        fs::read_to_string(log)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
