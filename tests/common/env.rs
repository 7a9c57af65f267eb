//! Test environment for isolated docklift runs.
//!
//! Provides `TestEnv` - a temporary workspace holding application roots,
//! a temporary home so no user configuration leaks in, and helpers to run
//! the CLI. Nothing here ever reaches a real host: the commands exercised
//! either stay local (`init`) or fail validation before any ssh call.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Result of running a docklift CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Isolated workspace with temp directories.
pub struct TestEnv {
    /// Directory whose children are application roots
    pub workspace: TempDir,
    /// Temporary directory for HOME and the user config dir
    pub home_dir: TempDir,
    bin: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            workspace: TempDir::new().expect("Failed to create workspace dir"),
            home_dir: TempDir::new().expect("Failed to create home dir"),
            bin: PathBuf::from(env!("CARGO_BIN_EXE_docklift")),
        }
    }

    /// Create `<workspace>/<name>/` and return it.
    pub fn app_root(&self, name: &str) -> PathBuf {
        let root = self.workspace.path().join(name);
        std::fs::create_dir_all(&root).expect("Failed to create app root");
        root
    }

    /// Path of the application document of `name`.
    pub fn document(&self, name: &str) -> PathBuf {
        self.app_root(name).join("docklift.yml")
    }

    /// A private key file that exists; its content is never read locally.
    pub fn ssh_key(&self) -> PathBuf {
        let key = self.home_dir.path().join(".ssh").join("id_ed25519");
        std::fs::create_dir_all(key.parent().unwrap()).unwrap();
        if !key.exists() {
            std::fs::write(&key, "not a real key\n").unwrap();
        }
        key
    }

    pub fn write(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }

    /// Run docklift with `cwd` as working directory.
    pub fn run_in(&self, cwd: &Path, args: &[&str]) -> TestResult {
        let output = Command::new(&self.bin)
            .current_dir(cwd)
            .args(args)
            .env("HOME", self.home_dir.path())
            .env("XDG_CONFIG_HOME", self.home_dir.path().join(".config"))
            .env("DOCKLIFT_COLOR", "never")
            .env_remove("DOCKLIFT_VERBOSITY")
            .output()
            .expect("Failed to execute docklift");
        to_result(output)
    }

    /// Run docklift from the workspace root.
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_in(self.workspace.path(), args)
    }

    /// `docklift init` for `name` with the usual flags plus `extra`.
    pub fn init(&self, name: &str, extra: &[&str]) -> TestResult {
        let document = self.document(name);
        let key = self.ssh_key();
        let domain = format!("{}.example.com", name);
        let mut args: Vec<&str> = vec![
            "init",
            "--config",
            document.to_str().unwrap(),
            "--name",
            name,
            "--domain",
            &domain,
            "--host",
            "203.0.113.7",
            "--key",
            key.to_str().unwrap(),
        ];
        args.extend_from_slice(extra);
        self.run(&args)
    }
}

fn to_result(output: Output) -> TestResult {
    TestResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}
