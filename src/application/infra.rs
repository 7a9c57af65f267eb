//! Infrastructure convergence
//!
//! Brings a host to "base-ready": container runtime installed, shared
//! network present, reverse proxy running with a routing document. Every
//! step queries first and acts only on a difference, so the use case can run
//! any number of times and resumes wherever a failed run stopped.

use serde::Serialize;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::domain::entities::RouteTable;
use crate::domain::ports::{ConvergeEvent, ConvergeEventSink, RemoteExecutor, Stage};
use crate::domain::services::{commands, render_proxy_manifest, ManifestError};
use crate::domain::value_objects::HostLayout;
use crate::error::ExitKind;

use super::host_lock::{HostLock, LockError};
use super::shell::{HostError, HostShell};

#[derive(Debug, Error)]
pub enum InfraError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("container runtime is not usable: {0}")]
    RuntimeUnusable(HostError),

    #[error("{} failed: {source}", .stage.label())]
    Step {
        stage: Stage,
        #[source]
        source: HostError,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl InfraError {
    pub fn kind(&self) -> ExitKind {
        match self {
            InfraError::Lock(e) => e.kind(),
            InfraError::RuntimeUnusable(e) | InfraError::Step { source: e, .. } => {
                e.transport_kind().unwrap_or(ExitKind::InfraNotReady)
            }
            InfraError::Manifest(_) => ExitKind::InfraNotReady,
        }
    }
}

fn at(stage: Stage) -> impl Fn(HostError) -> InfraError {
    move |source| InfraError::Step { stage, source }
}

/// What `ensure_base_ready` had to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InfraReport {
    pub runtime_installed: bool,
    pub network_created: bool,
    pub routing_document_created: bool,
    pub proxy_started: bool,
}

impl InfraReport {
    pub fn changed(&self) -> bool {
        self.runtime_installed
            || self.network_created
            || self.routing_document_created
            || self.proxy_started
    }
}

pub struct InfraUseCase<'a, E: RemoteExecutor> {
    executor: &'a E,
    events: &'a dyn ConvergeEventSink,
    config: &'a EngineConfig,
    layout: HostLayout,
    acme_email: Option<String>,
}

impl<'a, E: RemoteExecutor> InfraUseCase<'a, E> {
    pub fn new(executor: &'a E, events: &'a dyn ConvergeEventSink, config: &'a EngineConfig) -> Self {
        Self {
            executor,
            events,
            config,
            layout: config.layout(),
            acme_email: None,
        }
    }

    /// Contact address written into a newly created routing document.
    pub fn with_acme_email(mut self, email: Option<String>) -> Self {
        self.acme_email = email;
        self
    }

    /// Converge host-level prerequisites. Safe to call repeatedly.
    pub fn ensure_base_ready(&self) -> Result<InfraReport, InfraError> {
        let lock = HostLock::acquire(self.executor, self.events, &self.layout, &self.config.lock)?;
        let shell = HostShell::new(self.executor, self.events);
        let mut report = InfraReport::default();

        report.runtime_installed = self.ensure_runtime(&shell)?;
        report.network_created = self.ensure_network(&shell)?;
        let (document_created, proxy_started) = self.ensure_proxy(&shell)?;
        report.routing_document_created = document_created;
        report.proxy_started = proxy_started;

        lock.release()?;
        Ok(report)
    }

    fn ensure_runtime(&self, shell: &HostShell<'_, E>) -> Result<bool, InfraError> {
        self.started(Stage::Runtime);
        let present = shell
            .program_exists(commands::RUNTIME_BINARY)
            .map_err(at(Stage::Runtime))?;

        if !present {
            shell
                .run_ok(&commands::install_runtime())
                .map_err(at(Stage::Runtime))?;
            if !shell
                .program_exists(commands::RUNTIME_BINARY)
                .map_err(at(Stage::Runtime))?
            {
                return Err(InfraError::RuntimeUnusable(HostError::Command {
                    command: commands::install_runtime(),
                    exit_code: 0,
                    message: format!("`{}` is still not on PATH", commands::RUNTIME_BINARY),
                }));
            }
        }

        // Present is not the same as working; compose is needed for everything else.
        let version = shell
            .run_ok(&commands::runtime_info())
            .map_err(InfraError::RuntimeUnusable)?;
        shell
            .run_ok(&commands::compose_version())
            .map_err(InfraError::RuntimeUnusable)?;

        let version = version.stdout.trim().to_string();
        if present {
            self.skipped(Stage::Runtime, format!("docker {version} already installed"));
        } else {
            self.completed(Stage::Runtime, Some(format!("installed docker {version}")));
        }
        Ok(!present)
    }

    fn ensure_network(&self, shell: &HostShell<'_, E>) -> Result<bool, InfraError> {
        self.started(Stage::Network);
        let network = self.layout.network();
        let inspect = commands::network_inspect(network);

        if shell.run(&inspect).map_err(at(Stage::Network))?.success() {
            self.skipped(Stage::Network, format!("network '{network}' exists"));
            return Ok(false);
        }

        let create = commands::network_create(network);
        let output = shell.run(&create).map_err(at(Stage::Network))?;
        if !output.success() {
            // Lost a race with another creator: present is what we wanted.
            if shell.run(&inspect).map_err(at(Stage::Network))?.success() {
                self.skipped(Stage::Network, format!("network '{network}' exists"));
                return Ok(false);
            }
            return Err(at(Stage::Network)(HostError::failed(&create, &output)));
        }

        self.completed(Stage::Network, Some(format!("created network '{network}'")));
        Ok(true)
    }

    /// Returns (routing document created, proxy (re)started).
    fn ensure_proxy(&self, shell: &HostShell<'_, E>) -> Result<(bool, bool), InfraError> {
        self.started(Stage::Proxy);
        let proxy = at(Stage::Proxy);

        shell
            .run_ok(&commands::make_dir(&self.layout.proxy_dir()))
            .map_err(&proxy)?;

        let document = self.layout.routing_document();
        let document_created = !shell.path_exists(&document).map_err(&proxy)?;
        if document_created {
            let table = match &self.acme_email {
                Some(email) => RouteTable::with_acme_email(email),
                None => RouteTable::new(),
            };
            shell.write_file(&document, &table.render()).map_err(&proxy)?;
        }

        let manifest_path = self.layout.proxy_manifest();
        let manifest = render_proxy_manifest(&self.layout, &self.config.proxy.image)?;
        // engine-owned, so unreadable content is simply replaced
        let current = match shell.read_file(&manifest_path) {
            Err(HostError::NotText { .. }) => None,
            other => other.map_err(&proxy)?,
        };
        let manifest_changed = current.as_deref() != Some(manifest.as_str());
        if manifest_changed {
            shell.write_file(&manifest_path, &manifest).map_err(&proxy)?;
        }

        let running = shell
            .run(&commands::container_running(&self.layout.proxy_container()))
            .map_err(&proxy)?;
        let running = running.success() && running.stdout.trim() == "true";

        if running && !manifest_changed {
            self.skipped(Stage::Proxy, "proxy is running".to_string());
            return Ok((document_created, false));
        }

        shell
            .run_ok(&commands::compose(
                &self.layout.proxy_project(),
                &manifest_path,
                "up -d --remove-orphans",
            ))
            .map_err(&proxy)?;
        self.completed(
            Stage::Proxy,
            Some(format!("started {}", self.layout.proxy_container())),
        );
        Ok((document_created, true))
    }

    fn started(&self, stage: Stage) {
        self.events.on_event(ConvergeEvent::StageStarted { stage });
    }

    fn completed(&self, stage: Stage, detail: Option<String>) {
        self.events.on_event(ConvergeEvent::StageCompleted { stage, detail });
    }

    fn skipped(&self, stage: Stage, reason: String) {
        self.events.on_event(ConvergeEvent::StageSkipped { stage, reason });
    }
}
