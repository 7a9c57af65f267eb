//! RemoteExecutor port - the only way the engine touches the target host
//!
//! Four primitives are enough for every convergence step: run a command,
//! copy a file up, test for a path, test for a program. Retry and timeout
//! policy belong to the implementation, not to the engine.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for remote operations
pub type ExecResult<T> = Result<T, ExecError>;

/// Failures of the channel itself, as opposed to a command exiting non-zero.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Host could not be reached or refused authentication
    #[error("cannot reach {host}: {message}")]
    Unreachable { host: String, message: String },

    /// Local helper process (ssh, scp) could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// File copy to the host failed
    #[error("failed to copy {} to {remote}: {message}", local.display())]
    Transfer {
        local: PathBuf,
        remote: String,
        message: String,
    },
}

/// Outcome of one remote command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Byte offset of the first invalid UTF-8 sequence in the raw stdout.
    /// `stdout` is then a lossy decoding and must not be written back.
    pub stdout_invalid_at: Option<usize>,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            stdout_invalid_at: None,
        }
    }

    /// Decode raw process output, remembering where stdout stopped being UTF-8.
    pub fn from_bytes(exit_code: i32, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            exit_code,
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
            stdout_invalid_at: std::str::from_utf8(stdout).err().map(|e| e.valid_up_to()),
        }
    }

    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::new(0, stdout, "")
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::new(exit_code, "", stderr)
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Best human-readable explanation of a failure: stderr, else stdout.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("exit code {}", self.exit_code)
    }
}

/// Abstract remote host
///
/// Implementations:
/// - `SshExecutor` - ssh/scp child processes
/// - in-memory simulated hosts for testing
pub trait RemoteExecutor {
    /// Run a shell command; `privileged` asks for root rights.
    fn execute(&self, command: &str, privileged: bool) -> ExecResult<CommandOutput>;

    /// Copy a local file to a remote path.
    fn upload(&self, local: &Path, remote: &str) -> ExecResult<()>;

    /// Whether a remote path exists.
    fn path_exists(&self, remote: &str) -> ExecResult<bool>;

    /// Whether a program is on the remote `PATH`.
    fn program_exists(&self, name: &str) -> ExecResult<bool>;

    /// Short description of the host for messages.
    fn describe(&self) -> String {
        "remote host".to_string()
    }
}

impl<T: RemoteExecutor + ?Sized> RemoteExecutor for &T {
    fn execute(&self, command: &str, privileged: bool) -> ExecResult<CommandOutput> {
        (**self).execute(command, privileged)
    }

    fn upload(&self, local: &Path, remote: &str) -> ExecResult<()> {
        (**self).upload(local, remote)
    }

    fn path_exists(&self, remote: &str) -> ExecResult<bool> {
        (**self).path_exists(remote)
    }

    fn program_exists(&self, name: &str) -> ExecResult<bool> {
        (**self).program_exists(name)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
