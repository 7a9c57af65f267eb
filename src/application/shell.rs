//! Host shell helper shared by the use cases
//!
//! Wraps a [`RemoteExecutor`] so every command is announced to the event
//! sink and non-zero exits become typed errors carrying the command text.

use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::domain::ports::{
    CommandOutput, ConvergeEvent, ConvergeEventSink, ExecError, RemoteExecutor,
};
use crate::domain::services::commands;
use crate::error::ExitKind;

/// A host interaction that did not succeed.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("`{command}` exited with {exit_code}: {message}")]
    Command {
        command: String,
        exit_code: i32,
        message: String,
    },

    #[error("{path} is not valid UTF-8 (line {line})")]
    NotText { path: String, line: usize },

    #[error("failed to stage {what} locally: {source}")]
    Local {
        what: String,
        #[source]
        source: std::io::Error,
    },
}

impl HostError {
    pub(crate) fn failed(command: &str, output: &CommandOutput) -> Self {
        HostError::Command {
            command: command.to_string(),
            exit_code: output.exit_code,
            message: output.diagnostic(),
        }
    }

    /// The kind this failure has regardless of stage, if any.
    pub fn transport_kind(&self) -> Option<ExitKind> {
        match self {
            HostError::Exec(ExecError::Unreachable { .. }) => Some(ExitKind::RemoteUnreachable),
            _ => None,
        }
    }
}

/// Every engine command needs root on the host (docker, /opt).
const PRIVILEGED: bool = true;

pub(crate) struct HostShell<'a, E: RemoteExecutor> {
    executor: &'a E,
    events: &'a dyn ConvergeEventSink,
}

impl<'a, E: RemoteExecutor> HostShell<'a, E> {
    pub(crate) fn new(executor: &'a E, events: &'a dyn ConvergeEventSink) -> Self {
        Self { executor, events }
    }

    pub(crate) fn events(&self) -> &'a dyn ConvergeEventSink {
        self.events
    }

    /// Run a command and return its output whatever the exit code.
    pub(crate) fn run(&self, command: &str) -> Result<CommandOutput, HostError> {
        if self.events.wants_detailed_events() {
            self.events.on_event(ConvergeEvent::Command {
                command: command.to_string(),
                privileged: PRIVILEGED,
            });
        }
        Ok(self.executor.execute(command, PRIVILEGED)?)
    }

    /// Run a command that must exit zero.
    pub(crate) fn run_ok(&self, command: &str) -> Result<CommandOutput, HostError> {
        let output = self.run(command)?;
        if output.success() {
            Ok(output)
        } else {
            Err(HostError::failed(command, &output))
        }
    }

    pub(crate) fn path_exists(&self, remote: &str) -> Result<bool, HostError> {
        Ok(self.executor.path_exists(remote)?)
    }

    pub(crate) fn program_exists(&self, name: &str) -> Result<bool, HostError> {
        Ok(self.executor.program_exists(name)?)
    }

    pub(crate) fn upload(&self, local: &Path, remote: &str) -> Result<(), HostError> {
        Ok(self.executor.upload(local, remote)?)
    }

    /// Read a text file, `None` when it does not exist. Content that is not
    /// UTF-8 is an error, never a lossy string.
    pub(crate) fn read_file(&self, remote: &str) -> Result<Option<String>, HostError> {
        if !self.path_exists(remote)? {
            return Ok(None);
        }
        let output = self.run_ok(&commands::read_file(remote))?;
        if let Some(offset) = output.stdout_invalid_at {
            return Err(HostError::NotText {
                path: remote.to_string(),
                line: output.stdout[..offset].matches('\n').count() + 1,
            });
        }
        Ok(Some(output.stdout))
    }

    /// Replace a remote file atomically: upload beside it, then rename over.
    pub(crate) fn write_file(&self, remote: &str, content: &str) -> Result<(), HostError> {
        let local_error = |source| HostError::Local {
            what: remote.to_string(),
            source,
        };
        let mut staged = tempfile::NamedTempFile::new().map_err(local_error)?;
        staged
            .write_all(content.as_bytes())
            .and_then(|_| staged.flush())
            .map_err(local_error)?;

        let temporary = format!("{remote}.docklift-tmp");
        self.upload(staged.path(), &temporary)?;
        self.run_ok(&commands::move_file(&temporary, remote))?;
        Ok(())
    }
}
