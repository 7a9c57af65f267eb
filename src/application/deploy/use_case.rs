//! Deploy Use Case
//!
//! Converges one application on a base-ready host:
//! 1. Check the host prerequisites exist (runtime, network, routing document)
//! 2. Create the application's namespace directory
//! 3. Package the build context, upload it and swap it into place
//! 4. Render and write the service manifest
//! 5. Build images
//! 6. Start or reconcile containers, removing orphans
//! 7. Probe the application from inside the shared network
//! 8. Register the route
//!
//! A failed build leaves the previously running containers untouched: `up`
//! only runs after a successful build.

use std::thread;

use crate::application::routing::RoutingReconciler;
use crate::application::shell::{HostError, HostShell};
use crate::config::EngineConfig;
use crate::domain::entities::ApplicationSpec;
use crate::domain::ports::{
    ContextPackager, ConvergeEvent, ConvergeEventSink, NoopEventSink, RemoteExecutor, Stage,
};
use crate::domain::services::{commands, render_manifest};
use crate::domain::value_objects::HostLayout;

use super::options::DeployOptions;
use super::result::{DeployError, DeployReport, HealthStatus};

/// HTTP status printed by the probe when nothing answered.
const NO_ANSWER: &str = "000";

/// Deploy use case
///
/// Generic over the host channel and the context packager so it can be
/// driven against an in-memory host in tests.
pub struct DeployUseCase<E, P>
where
    E: RemoteExecutor,
    P: ContextPackager,
{
    executor: E,
    packager: P,
    config: EngineConfig,
    layout: HostLayout,
}

impl<E, P> DeployUseCase<E, P>
where
    E: RemoteExecutor,
    P: ContextPackager,
{
    pub fn new(executor: E, packager: P, config: EngineConfig) -> Self {
        let layout = config.layout();
        Self {
            executor,
            packager,
            config,
            layout,
        }
    }

    /// Execute the deploy silently.
    pub fn execute(
        &self,
        spec: &ApplicationSpec,
        options: &DeployOptions,
    ) -> Result<DeployReport, DeployError> {
        self.execute_with_events(spec, options, &NoopEventSink)
    }

    /// Execute the deploy, reporting progress to `events`.
    pub fn execute_with_events(
        &self,
        spec: &ApplicationSpec,
        options: &DeployOptions,
        events: &dyn ConvergeEventSink,
    ) -> Result<DeployReport, DeployError> {
        let app = spec.name.as_str();
        let port = spec.port.ok_or_else(|| DeployError::PortUnassigned {
            app: app.to_string(),
        })?;
        let shell = HostShell::new(&self.executor, events);
        let mut warnings = Vec::new();

        self.precheck(&shell)?;

        // 1. namespace
        started(events, Stage::Namespace);
        let app_dir = self.layout.app_dir(app);
        shell
            .run_ok(&commands::make_dir(&app_dir))
            .map_err(at(Stage::Namespace))?;
        completed(events, Stage::Namespace, Some(app_dir));

        // 2. build context
        started(events, Stage::Context);
        let staging = tempfile::tempdir().map_err(|source| {
            at(Stage::Context)(HostError::Local {
                what: "context archive".to_string(),
                source,
            })
        })?;
        let package = self.packager.package(&spec.context, staging.path())?;
        let archive = self.layout.app_archive(app);
        shell
            .upload(&package.archive, &archive)
            .map_err(at(Stage::Context))?;
        shell
            .run_ok(&commands::unpack_context(
                &archive,
                &self.layout.app_staging_dir(app),
                &self.layout.app_context_dir(app),
            ))
            .map_err(at(Stage::Context))?;
        completed(
            events,
            Stage::Context,
            Some(format!(
                "{} files, {} bytes, {}",
                package.file_count,
                package.bytes,
                package.digest.short()
            )),
        );

        // 3. manifest
        started(events, Stage::Manifest);
        let manifest_path = self.layout.app_manifest(app);
        let manifest = render_manifest(spec, port, &self.layout)?;
        shell
            .write_file(&manifest_path, &manifest)
            .map_err(at(Stage::Manifest))?;
        completed(events, Stage::Manifest, Some(manifest_path.clone()));

        // 4. build; a failure here leaves running containers alone
        started(events, Stage::Build);
        shell
            .run_ok(&commands::compose(app, &manifest_path, "build"))
            .map_err(at(Stage::Build))?;
        completed(events, Stage::Build, None);

        // 5. start
        started(events, Stage::Start);
        shell
            .run_ok(&commands::compose(app, &manifest_path, "up -d --remove-orphans"))
            .map_err(at(Stage::Start))?;
        completed(
            events,
            Stage::Start,
            Some(format!("{} service(s)", spec.services.len() + 1)),
        );

        // 6. health
        let upstream = self.layout.upstream(app, port);
        let health = if options.skip_health_check {
            skipped(events, Stage::Health, "disabled".to_string());
            HealthStatus::Skipped
        } else {
            self.probe(&shell, &upstream)?
        };
        if let HealthStatus::TimedOut { attempts } = health {
            let message = format!(
                "{upstream} did not answer after {attempts} attempt(s); routing anyway"
            );
            events.on_event(ConvergeEvent::Warning {
                message: message.clone(),
            });
            warnings.push(message);
        }

        // 7. route
        started(events, Stage::Route);
        let outcome = RoutingReconciler::new(
            &self.executor,
            events,
            &self.layout,
            &self.config.lock,
        )
        .upsert_route(&spec.domain, &upstream)?;
        completed(
            events,
            Stage::Route,
            Some(format!("{} -> {} ({})", spec.domain, upstream, outcome.change.label())),
        );

        Ok(DeployReport {
            app: app.to_string(),
            domain: spec.domain.to_string(),
            port,
            upstream,
            context_digest: package.digest.to_string(),
            context_files: package.file_count,
            context_bytes: package.bytes,
            health,
            route_change: outcome.change.label().to_string(),
            route_diff: outcome.diff,
            warnings,
        })
    }

    /// Refuse to deploy onto a host that was never set up.
    fn precheck(&self, shell: &HostShell<'_, E>) -> Result<(), DeployError> {
        let missing = |what: &str| DeployError::InfraMissing {
            what: what.to_string(),
        };

        if !shell
            .program_exists(commands::RUNTIME_BINARY)
            .map_err(at(Stage::Runtime))?
        {
            return Err(missing("container runtime is not installed"));
        }
        let network = self.layout.network();
        if !shell
            .run(&commands::network_inspect(network))
            .map_err(at(Stage::Network))?
            .success()
        {
            return Err(missing(&format!("network '{network}' does not exist")));
        }
        if !shell
            .path_exists(&self.layout.routing_document())
            .map_err(at(Stage::Proxy))?
        {
            return Err(missing("routing document does not exist"));
        }
        Ok(())
    }

    /// Poll the application until it answers or the attempt budget runs out.
    fn probe(&self, shell: &HostShell<'_, E>, upstream: &str) -> Result<HealthStatus, DeployError> {
        let events = shell.events();
        let health = &self.config.health;
        let command = commands::probe(
            self.layout.network(),
            &health.probe_image,
            &format!("http://{upstream}/"),
            health.timeout_secs,
        );
        let attempts = health.attempts.max(1);
        started(events, Stage::Health);

        for attempt in 1..=attempts {
            let output = shell.run(&command).map_err(at(Stage::Health))?;
            let code = output.stdout.trim();
            if !code.is_empty() && code != NO_ANSWER {
                let status = if is_success_code(code) {
                    HealthStatus::Healthy {
                        code: code.to_string(),
                        attempts: attempt,
                    }
                } else {
                    HealthStatus::Responding {
                        code: code.to_string(),
                        attempts: attempt,
                    }
                };
                completed(
                    events,
                    Stage::Health,
                    Some(format!("HTTP {code} after {attempt} attempt(s)")),
                );
                return Ok(status);
            }
            if attempt < attempts {
                thread::sleep(health.interval());
            }
        }

        Ok(HealthStatus::TimedOut { attempts })
    }
}

/// 2xx and 3xx count as healthy.
fn is_success_code(code: &str) -> bool {
    matches!(code.as_bytes().first(), Some(b'2' | b'3')) && code.len() == 3
}

fn at(stage: Stage) -> impl Fn(HostError) -> DeployError {
    move |source| DeployError::Stage { stage, source }
}

fn started(events: &dyn ConvergeEventSink, stage: Stage) {
    events.on_event(ConvergeEvent::StageStarted { stage });
}

fn completed(events: &dyn ConvergeEventSink, stage: Stage, detail: Option<String>) {
    events.on_event(ConvergeEvent::StageCompleted { stage, detail });
}

fn skipped(events: &dyn ConvergeEventSink, stage: Stage, reason: String) {
    events.on_event(ConvergeEvent::StageSkipped { stage, reason });
}

#[cfg(test)]
mod probe_tests {
    use super::is_success_code;

    #[test]
    fn success_codes() {
        assert!(is_success_code("200"));
        assert!(is_success_code("301"));
        assert!(!is_success_code("404"));
        assert!(!is_success_code("502"));
        assert!(!is_success_code("2"));
    }
}
