use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

/// Scratch directory holding stand-in gh/aws binaries that log their
/// invocations, plus the canned responses they serve.
pub struct StubCloud {
    pub dir: TempDir,
}

impl StubCloud {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Install a stub binary; `behavior` runs after the invocation is
    /// logged and can emit canned output per subcommand.
    pub fn write_bin(&self, name: &str, behavior: &str) -> PathBuf {
        let log = self.log_path(name);
        let bin = self.dir.path().join(name);
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

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn log_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{name}.log"))
    }

    pub fn invocations(&self, name: &str) -> Vec<String> {
        let log = self.log_path(name);
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
