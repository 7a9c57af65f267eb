use std::path::Path;

use anyhow::Result;

use docklift::application::InfraUseCase;
use docklift::domain::ports::RemoteExecutor;
use docklift::{DockliftError, ExitKind};

use super::{executor, load_settings, Session};
use crate::ui::output::emit_result;
use crate::ui::views::setup::{render_setup_header, render_setup_summary};

pub fn cmd_setup(session: &Session, document: &Path) -> Result<ExitKind> {
    let settings = load_settings(session, document)?;
    let executor = executor(&settings);
    let ui = session.ui;

    session.print(&render_setup_header(
        &executor.describe(),
        session.config.layout().network(),
        ui.color,
        ui.unicode,
    ));

    let events = session.events("setup");
    let report = InfraUseCase::new(&executor, events.as_ref(), &session.config)
        .with_acme_email(settings.host.acme_email.clone())
        .ensure_base_ready()
        .map_err(DockliftError::from)?;

    if ui.json {
        emit_result("setup", ExitKind::Success, &report)?;
    } else {
        session.print(&render_setup_summary(&report, ui.color, ui.unicode));
    }
    Ok(ExitKind::Success)
}
