use std::path::Path;

use anyhow::Result;

use docklift::application::StatusUseCase;
use docklift::{DockliftError, ExitKind};

use super::{executor, load_settings, Session};
use crate::ui::output::emit_result;
use crate::ui::views::status::render_status;

pub fn cmd_status(session: &Session, document: &Path) -> Result<ExitKind> {
    let settings = load_settings(session, document)?;
    let executor = executor(&settings);

    let report = StatusUseCase::new(&executor, &session.config)
        .execute(&settings.application)
        .map_err(DockliftError::from)?;

    let ui = session.ui;
    if ui.json {
        emit_result("status", ExitKind::Success, &report)?;
    } else {
        session.print(&render_status(&report, ui.color, ui.unicode));
    }
    Ok(ExitKind::Success)
}
