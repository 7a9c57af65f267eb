//! Remove Use Case
//!
//! Takes one application off the host: its route first, so the proxy never
//! forwards to a vanished upstream, then its containers (and optionally named
//! volumes), then its namespace directory. Every step tolerates the thing it
//! removes already being gone, so an interrupted removal can be re-run.

use serde::Serialize;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::domain::entities::ApplicationSpec;
use crate::domain::ports::{ConvergeEvent, ConvergeEventSink, RemoteExecutor, Stage};
use crate::domain::services::commands;
use crate::domain::value_objects::HostLayout;
use crate::error::ExitKind;

use super::routing::{RoutingError, RoutingReconciler};
use super::shell::{HostError, HostShell};

#[derive(Debug, Error)]
pub enum RemoveError {
    #[error("route removal failed: {0}")]
    Routing(#[from] RoutingError),

    #[error("{} failed: {source}", .stage.label())]
    Stage {
        stage: Stage,
        #[source]
        source: HostError,
    },
}

impl RemoveError {
    pub fn kind(&self) -> ExitKind {
        match self {
            RemoveError::Routing(e) => e.kind(),
            RemoveError::Stage { source, .. } => {
                source.transport_kind().unwrap_or(ExitKind::InfraNotReady)
            }
        }
    }
}

/// Result of a removal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoveReport {
    pub app: String,
    pub domain: String,
    pub route_removed: bool,
    pub containers_removed: bool,
    pub volumes_purged: bool,
    pub namespace_removed: bool,
}

pub struct RemoveUseCase<'a, E: RemoteExecutor> {
    executor: &'a E,
    events: &'a dyn ConvergeEventSink,
    config: &'a EngineConfig,
    layout: HostLayout,
}

impl<'a, E: RemoteExecutor> RemoveUseCase<'a, E> {
    pub fn new(executor: &'a E, events: &'a dyn ConvergeEventSink, config: &'a EngineConfig) -> Self {
        Self {
            executor,
            events,
            config,
            layout: config.layout(),
        }
    }

    pub fn execute(
        &self,
        spec: &ApplicationSpec,
        purge_volumes: bool,
    ) -> Result<RemoveReport, RemoveError> {
        let app = spec.name.as_str();
        let shell = HostShell::new(self.executor, self.events);
        let mut report = RemoveReport {
            app: app.to_string(),
            domain: spec.domain.to_string(),
            ..RemoveReport::default()
        };

        self.started(Stage::Route);
        let outcome = RoutingReconciler::new(
            self.executor,
            self.events,
            &self.layout,
            &self.config.lock,
        )
        .remove_route(&spec.domain)?;
        report.route_removed = outcome.change.is_mutation();
        self.completed(
            Stage::Route,
            Some(format!("{} ({})", spec.domain, outcome.change.label())),
        );

        self.started(Stage::Teardown);
        if shell
            .program_exists(commands::RUNTIME_BINARY)
            .map_err(at(Stage::Teardown))?
        {
            let down = if purge_volumes {
                "down --remove-orphans -v"
            } else {
                "down --remove-orphans"
            };
            let manifest = self.layout.app_manifest(app);
            // without the manifest, compose finds containers by project label
            let command = if shell.path_exists(&manifest).map_err(at(Stage::Teardown))? {
                commands::compose(app, &manifest, down)
            } else {
                commands::compose_project(app, down)
            };
            shell.run_ok(&command).map_err(at(Stage::Teardown))?;
            report.containers_removed = true;
            report.volumes_purged = purge_volumes;
            self.completed(
                Stage::Teardown,
                Some(if purge_volumes {
                    "containers and volumes removed".to_string()
                } else {
                    "containers removed, volumes kept".to_string()
                }),
            );
        } else {
            self.skipped(Stage::Teardown, "container runtime is not installed".to_string());
        }

        self.started(Stage::Cleanup);
        let app_dir = self.layout.app_dir(app);
        if shell.path_exists(&app_dir).map_err(at(Stage::Cleanup))? {
            shell
                .run_ok(&commands::remove_path(&app_dir))
                .map_err(at(Stage::Cleanup))?;
            report.namespace_removed = true;
            self.completed(Stage::Cleanup, Some(app_dir));
        } else {
            self.skipped(Stage::Cleanup, format!("{app_dir} does not exist"));
        }

        Ok(report)
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

fn at(stage: Stage) -> impl Fn(HostError) -> RemoveError {
    move |source| RemoveError::Stage { stage, source }
}
