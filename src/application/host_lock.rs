//! Host-side mutual exclusion
//!
//! `mkdir` is atomic on every POSIX filesystem, so the lock is a directory
//! under the managed base. The owner file inside it says who holds the lock
//! and since when. The guard removes the directory when dropped.
//!
//! A run that was killed never drops its guard. Its lock is taken over when
//! the owner is a dead process on this machine, or when the lock is older
//! than `LockConfig::stale_after`.

use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::LockConfig;
use crate::domain::ports::{ConvergeEvent, ConvergeEventSink, RemoteExecutor};
use crate::domain::services::commands;
use crate::domain::value_objects::HostLayout;
use crate::error::ExitKind;

use super::shell::{HostError, HostShell};

#[derive(Debug, Error)]
pub enum LockError {
    #[error("host is locked by {owner}; if that run is gone, use `docklift unlock`")]
    Held { owner: String },

    #[error("failed to take host lock: {0}")]
    Host(#[from] HostError),
}

impl LockError {
    pub fn kind(&self) -> ExitKind {
        match self {
            LockError::Held { .. } => ExitKind::HostLocked,
            LockError::Host(e) => e.transport_kind().unwrap_or(ExitKind::InfraNotReady),
        }
    }
}

/// Held host lock; released on drop.
pub struct HostLock<'a, E: RemoteExecutor> {
    shell: HostShell<'a, E>,
    lock_dir: String,
    released: bool,
}

impl<'a, E: RemoteExecutor> HostLock<'a, E> {
    /// Take the lock, retrying while another run holds it for up to
    /// `config.wait()`.
    pub fn acquire(
        executor: &'a E,
        events: &'a dyn ConvergeEventSink,
        layout: &HostLayout,
        config: &LockConfig,
    ) -> Result<Self, LockError> {
        let shell = HostShell::new(executor, events);
        let lock_dir = layout.lock_dir();
        let command = commands::lock_acquire(
            layout.base_dir(),
            &lock_dir,
            &layout.lock_owner_file(),
            &owner_tag(),
        );
        let started = Instant::now();
        let mut took_over = false;

        loop {
            let output = shell.run(&command)?;
            if output.success() {
                return Ok(Self {
                    shell,
                    lock_dir,
                    released: false,
                });
            }

            // mkdir failed for a reason other than an existing lock.
            if !shell.path_exists(&lock_dir)? {
                return Err(HostError::failed(&command, &output).into());
            }

            if !took_over {
                let owner = read_owner(&shell, layout)?;
                let abandoned = LockOwner::parse(&owner).abandoned(
                    Utc::now(),
                    config.stale_after(),
                    &machine_name(),
                    std::process::id(),
                    process_alive,
                );
                if abandoned {
                    took_over = true;
                    events.on_event(ConvergeEvent::Warning {
                        message: format!("taking over abandoned host lock held by {owner}"),
                    });
                    let aside = format!("{}.stale-{}", lock_dir, std::process::id());
                    // losing the race to another run is fine; mkdir decides
                    shell.run(&commands::lock_take_over(&lock_dir, &aside))?;
                    continue;
                }
            }

            if started.elapsed() >= config.wait() {
                let owner = read_owner(&shell, layout)?;
                return Err(LockError::Held { owner });
            }
            thread::sleep(config.retry_interval());
        }
    }

    /// Release explicitly, surfacing errors the drop path would swallow.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.shell.run_ok(&commands::remove_path(&self.lock_dir))?;
        Ok(())
    }
}

impl<E: RemoteExecutor> Drop for HostLock<'_, E> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.shell.run(&commands::remove_path(&self.lock_dir));
        }
    }
}

/// Remove a lock left behind by a dead run. Returns the recorded owner.
pub fn force_unlock<E: RemoteExecutor>(
    executor: &E,
    events: &dyn ConvergeEventSink,
    layout: &HostLayout,
) -> Result<Option<String>, LockError> {
    let shell = HostShell::new(executor, events);
    if !shell.path_exists(&layout.lock_dir())? {
        return Ok(None);
    }
    let owner = read_owner(&shell, layout)?;
    shell.run_ok(&commands::remove_path(&layout.lock_dir()))?;
    Ok(Some(owner))
}

fn read_owner<E: RemoteExecutor>(
    shell: &HostShell<'_, E>,
    layout: &HostLayout,
) -> Result<String, HostError> {
    let owner = shell
        .read_file(&layout.lock_owner_file())?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Ok(owner.unwrap_or_else(|| "an unknown run".to_string()))
}

/// What an owner line says about the run that wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct LockOwner {
    machine: Option<String>,
    pid: Option<u32>,
    at: Option<DateTime<Utc>>,
}

impl LockOwner {
    /// Parse `user@machine pid=N at=RFC3339`; missing parts stay `None`.
    fn parse(line: &str) -> Self {
        let mut owner = Self::default();
        for word in line.split_whitespace() {
            if let Some(pid) = word.strip_prefix("pid=") {
                owner.pid = pid.parse().ok();
            } else if let Some(at) = word.strip_prefix("at=") {
                owner.at = DateTime::parse_from_rfc3339(at)
                    .ok()
                    .map(|t| t.with_timezone(&Utc));
            } else if owner.machine.is_none() {
                owner.machine = word.split_once('@').map(|(_, m)| m.to_string());
            }
        }
        owner
    }

    /// Whether the run that wrote this line can no longer release its lock.
    /// A process holds at most one host lock, so a lock recorded under our
    /// own pid on this machine was left behind by this process.
    fn abandoned(
        &self,
        now: DateTime<Utc>,
        stale_after: Option<Duration>,
        local_machine: &str,
        local_pid: u32,
        alive: impl Fn(u32) -> bool,
    ) -> bool {
        if let (Some(at), Some(limit)) = (self.at, stale_after) {
            let age = now.signed_duration_since(at).to_std().unwrap_or_default();
            if age >= limit {
                return true;
            }
        }
        match (&self.machine, self.pid) {
            (Some(machine), Some(pid)) if machine == local_machine => {
                pid == local_pid || !alive(pid)
            }
            _ => false,
        }
    }
}

/// `kill -0` succeeds for a live process; only "no such process" counts as
/// dead, anything else (no permission, no `kill`) as alive.
fn process_alive(pid: u32) -> bool {
    let output = Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stdin(Stdio::null())
        .output();
    match output {
        Ok(output) if !output.status.success() => !String::from_utf8_lossy(&output.stderr)
            .to_lowercase()
            .contains("no such process"),
        _ => true,
    }
}

/// `user@machine pid=N at=RFC3339` for the owner file.
pub fn owner_tag() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    format!(
        "{}@{} pid={} at={}",
        user,
        machine_name(),
        std::process::id(),
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    )
}

/// Name of the local machine as the OS reports it.
fn machine_name() -> String {
    let name = gethostname::gethostname().to_string_lossy().trim().to_string();
    if !name.is_empty() {
        return name;
    }
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".to_string())
}
