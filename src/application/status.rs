//! Status Use Case
//!
//! Read-only view of what the host currently has for one application. Takes
//! no lock and changes nothing.

use serde::Serialize;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::domain::entities::ApplicationSpec;
use crate::domain::ports::{NoopEventSink, RemoteExecutor};
use crate::domain::services::commands;
use crate::domain::value_objects::HostLayout;
use crate::error::ExitKind;

use super::routing::{RoutingError, RoutingReconciler};
use super::shell::{HostError, HostShell};

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("status query failed: {0}")]
    Host(#[from] HostError),

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

impl StatusError {
    pub fn kind(&self) -> ExitKind {
        match self {
            StatusError::Host(e) => e.transport_kind().unwrap_or(ExitKind::InfraNotReady),
            StatusError::Routing(e) => e.kind(),
        }
    }
}

/// One container as the runtime lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerStatus {
    pub name: String,
    pub state: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub app: String,
    pub domain: String,
    pub runtime: bool,
    pub network: bool,
    pub proxy_running: bool,
    pub namespace: bool,
    pub manifest: bool,
    /// Upstream the routing document has for the domain
    pub route: Option<String>,
    /// Upstream a deploy of the current settings would register
    pub expected_route: Option<String>,
    pub containers: Vec<ContainerStatus>,
}

impl StatusReport {
    pub fn base_ready(&self) -> bool {
        self.runtime && self.network && self.proxy_running
    }

    pub fn route_current(&self) -> bool {
        self.route.is_some() && self.route == self.expected_route
    }

    /// Everything in place and every container running.
    pub fn healthy(&self) -> bool {
        self.base_ready()
            && self.manifest
            && self.route_current()
            && !self.containers.is_empty()
            && self.containers.iter().all(|c| c.state == "running")
    }
}

pub struct StatusUseCase<'a, E: RemoteExecutor> {
    executor: &'a E,
    config: &'a EngineConfig,
    layout: HostLayout,
}

impl<'a, E: RemoteExecutor> StatusUseCase<'a, E> {
    pub fn new(executor: &'a E, config: &'a EngineConfig) -> Self {
        Self {
            executor,
            config,
            layout: config.layout(),
        }
    }

    pub fn execute(&self, spec: &ApplicationSpec) -> Result<StatusReport, StatusError> {
        let app = spec.name.as_str();
        let shell = HostShell::new(self.executor, &NoopEventSink);
        let mut report = StatusReport {
            app: app.to_string(),
            domain: spec.domain.to_string(),
            expected_route: spec.port.map(|port| self.layout.upstream(app, port)),
            ..StatusReport::default()
        };

        report.runtime = shell.program_exists(commands::RUNTIME_BINARY)?;
        report.namespace = shell.path_exists(&self.layout.app_dir(app))?;
        report.manifest = shell.path_exists(&self.layout.app_manifest(app))?;

        if shell.path_exists(&self.layout.routing_document())? {
            report.route = RoutingReconciler::new(
                self.executor,
                &NoopEventSink,
                &self.layout,
                &self.config.lock,
            )
            .lookup(&spec.domain)?;
        }

        if !report.runtime {
            return Ok(report);
        }

        report.network = shell
            .run(&commands::network_inspect(self.layout.network()))?
            .success();
        let proxy = shell.run(&commands::container_running(&self.layout.proxy_container()))?;
        report.proxy_running = proxy.success() && proxy.stdout.trim() == "true";

        let listing = shell.run(&commands::compose_ps(app))?;
        if listing.success() {
            report.containers = parse_listing(&listing.stdout);
        }

        Ok(report)
    }
}

/// Parse `name<TAB>state<TAB>status` lines.
fn parse_listing(stdout: &str) -> Vec<ContainerStatus> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.splitn(3, '\t');
            ContainerStatus {
                name: fields.next().unwrap_or_default().trim().to_string(),
                state: fields.next().unwrap_or_default().trim().to_string(),
                status: fields.next().unwrap_or_default().trim().to_string(),
            }
        })
        .collect()
}
