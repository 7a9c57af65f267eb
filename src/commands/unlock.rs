use std::path::Path;

use anyhow::Result;

use docklift::application::force_unlock;
use docklift::domain::ports::RemoteExecutor;
use docklift::{DockliftError, ExitKind};

use super::{executor, load_settings, Session};
use crate::ui::output::emit_result;
use crate::ui::primitives::icon::Icon;

pub fn cmd_unlock(session: &Session, document: &Path) -> Result<ExitKind> {
    let settings = load_settings(session, document)?;
    let executor = executor(&settings);
    let events = session.events("unlock");

    let owner = force_unlock(&executor, events.as_ref(), &session.config.layout())
        .map_err(DockliftError::from)?;

    let ui = session.ui;
    if ui.json {
        emit_result(
            "unlock",
            ExitKind::Success,
            &serde_json::json!({ "removed": owner.is_some(), "owner": owner }),
        )?;
        return Ok(ExitKind::Success);
    }

    let message = match owner {
        Some(owner) => format!("Removed lock held by {} on {}", owner, executor.describe()),
        None => format!("{} was not locked", executor.describe()),
    };
    session.print(&format!(
        "{} {}\n",
        Icon::Success.colored(ui.color, ui.unicode),
        message
    ));
    Ok(ExitKind::Success)
}
