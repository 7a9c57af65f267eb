use std::path::Path;

use anyhow::Result;

use docklift::application::{DeployOptions, DeployUseCase, InfraUseCase, InitUseCase};
use docklift::domain::ports::{ConvergeEvent, ConvergeEventSink, RemoteExecutor};
use docklift::infrastructure::{ContextArchiver, YamlSpecRepository};
use docklift::{DockliftError, ExitKind};

use super::{executor, Session};
use crate::ui::output::{emit_result, print_config_warnings};
use crate::ui::views::deploy::{render_deploy_header, render_deploy_summary};

pub fn cmd_deploy(
    session: &Session,
    document: &Path,
    skip_setup: bool,
    skip_health_check: bool,
) -> Result<ExitKind> {
    let init = InitUseCase::new(YamlSpecRepository::new());
    let ensured = init.ensure_port(document);
    print_config_warnings(&session.ui, &init.repository().take_warnings());
    let (settings, assignment) = ensured.map_err(DockliftError::from)?;

    let executor = executor(&settings);
    let ui = session.ui;
    let events = session.events("deploy");

    session.print(&render_deploy_header(
        settings.application.name.as_str(),
        settings.application.domain.as_str(),
        &executor.describe(),
        ui.color,
        ui.unicode,
    ));
    if assignment.allocated {
        events.on_event(ConvergeEvent::Warning {
            message: format!(
                "no port configured; allocated {} and saved it to {}",
                assignment.port,
                document.display()
            ),
        });
    }

    if !skip_setup {
        InfraUseCase::new(&executor, events.as_ref(), &session.config)
            .with_acme_email(settings.host.acme_email.clone())
            .ensure_base_ready()
            .map_err(DockliftError::from)?;
    }

    let options = DeployOptions::new().skip_health_check(skip_health_check);
    let report = DeployUseCase::new(&executor, ContextArchiver::new(), session.config.clone())
        .execute_with_events(&settings.application, &options, events.as_ref())
        .map_err(DockliftError::from)?;

    let kind = report.kind();
    if ui.json {
        emit_result("deploy", kind, &report)?;
    } else {
        session.print(&render_deploy_summary(&report, ui.color, ui.unicode));
    }
    Ok(kind)
}
