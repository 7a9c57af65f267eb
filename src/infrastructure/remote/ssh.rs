//! SSH Remote Executor
//!
//! Implements the `RemoteExecutor` port with `ssh` and `scp` child
//! processes. Authentication is key-only (`BatchMode`), so a missing or
//! rejected key fails fast instead of prompting.
//!
//! Privileged commands for a non-root user run through `sudo -n`; uploads
//! then go to `/tmp` first and are moved into place with sudo.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::domain::entities::HostTarget;
use crate::domain::ports::{CommandOutput, ExecError, ExecResult, RemoteExecutor};
use crate::domain::services::commands::quote;

/// Exit status ssh itself uses for connection and authentication failures.
const SSH_FAILURE: i32 = 255;

/// Seconds to wait for the TCP connection
const CONNECT_TIMEOUT: u32 = 15;

pub struct SshExecutor {
    target: HostTarget,
    ssh_program: String,
    scp_program: String,
}

impl SshExecutor {
    pub fn new(target: HostTarget) -> Self {
        Self {
            target,
            ssh_program: "ssh".to_string(),
            scp_program: "scp".to_string(),
        }
    }

    /// Use other client programs (wrappers, test doubles).
    pub fn with_programs(mut self, ssh: impl Into<String>, scp: impl Into<String>) -> Self {
        self.ssh_program = ssh.into();
        self.scp_program = scp.into();
        self
    }

    pub fn target(&self) -> &HostTarget {
        &self.target
    }

    /// Options shared by ssh and scp.
    fn common_options(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.target.key_path.to_string_lossy().into_owned(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={CONNECT_TIMEOUT}"),
        ]
    }

    fn ssh_args(&self, remote_command: &str) -> Vec<String> {
        let mut args = self.common_options();
        args.push("-p".to_string());
        args.push(self.target.port.to_string());
        args.push(self.target.destination());
        args.push(remote_command.to_string());
        args
    }

    fn scp_args(&self, local: &Path, remote: &str) -> Vec<String> {
        let mut args = self.common_options();
        args.push("-P".to_string());
        args.push(self.target.port.to_string());
        args.push("-q".to_string());
        args.push(local.to_string_lossy().into_owned());
        args.push(format!("{}:{}", self.target.destination(), remote));
        args
    }

    /// The command line the remote shell receives.
    fn remote_command(&self, command: &str, privileged: bool) -> String {
        if privileged && self.target.needs_sudo() {
            format!("sudo -n sh -c {}", quote(command))
        } else {
            command.to_string()
        }
    }

    fn spawn(&self, program: &str, args: &[String]) -> ExecResult<Output> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })
    }

    fn unreachable(&self, stderr: &str) -> ExecError {
        ExecError::Unreachable {
            host: self.target.destination(),
            message: stderr.trim().to_string(),
        }
    }

    /// Upload staging path for non-root users.
    fn staging_path(remote: &str) -> String {
        let name = remote.rsplit('/').next().unwrap_or("upload");
        format!("/tmp/docklift-{}-{}", std::process::id(), name)
    }
}

impl RemoteExecutor for SshExecutor {
    fn execute(&self, command: &str, privileged: bool) -> ExecResult<CommandOutput> {
        let args = self.ssh_args(&self.remote_command(command, privileged));
        let output = self.spawn(&self.ssh_program, &args)?;
        let exit_code = output.status.code().unwrap_or(-1);
        let result = CommandOutput::from_bytes(exit_code, &output.stdout, &output.stderr);

        if exit_code == SSH_FAILURE {
            return Err(self.unreachable(&result.stderr));
        }
        Ok(result)
    }

    fn upload(&self, local: &Path, remote: &str) -> ExecResult<()> {
        let transfer = |message: String| ExecError::Transfer {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            message,
        };

        let destination = if self.target.needs_sudo() {
            Self::staging_path(remote)
        } else {
            remote.to_string()
        };

        let output = self.spawn(&self.scp_program, &self.scp_args(local, &destination))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            if output.status.code() == Some(SSH_FAILURE) {
                return Err(self.unreachable(&stderr));
            }
            return Err(transfer(stderr.trim().to_string()));
        }

        if destination != remote {
            let moved = self.execute(
                &format!("mv -f {} {}", quote(&destination), quote(remote)),
                true,
            )?;
            if !moved.success() {
                let _ = self.execute(&format!("rm -f {}", quote(&destination)), false);
                return Err(transfer(moved.diagnostic()));
            }
        }
        Ok(())
    }

    fn path_exists(&self, remote: &str) -> ExecResult<bool> {
        Ok(self
            .execute(&format!("test -e {}", quote(remote)), true)?
            .success())
    }

    fn program_exists(&self, name: &str) -> ExecResult<bool> {
        Ok(self
            .execute(&format!("command -v {} >/dev/null 2>&1", quote(name)), false)?
            .success())
    }

    fn describe(&self) -> String {
        if self.target.port == 22 {
            self.target.destination()
        } else {
            format!("{}:{}", self.target.destination(), self.target.port)
        }
    }
}
