use std::path::Path;

use anyhow::Result;

use docklift::application::RemoveUseCase;
use docklift::{DockliftError, ExitKind};

use super::{executor, load_settings, Session};
use crate::ui::output::emit_result;
use crate::ui::views::remove::render_remove_summary;

pub fn cmd_remove(session: &Session, document: &Path, purge_volumes: bool) -> Result<ExitKind> {
    let settings = load_settings(session, document)?;
    let executor = executor(&settings);
    let events = session.events("remove");

    let report = RemoveUseCase::new(&executor, events.as_ref(), &session.config)
        .execute(&settings.application, purge_volumes)
        .map_err(DockliftError::from)?;

    let ui = session.ui;
    if ui.json {
        emit_result("remove", ExitKind::Success, &report)?;
    } else {
        session.print(&render_remove_summary(&report, ui.color, ui.unicode));
    }
    Ok(ExitKind::Success)
}
