use std::io::{self, Write};

use serde::Serialize;

use docklift::config::ConfigWarning;

use crate::ui::context::UiContext;
use crate::ui::primitives::icon::Icon;

pub fn print_config_warnings(ui: &UiContext, warnings: &[ConfigWarning]) {
    for w in warnings {
        if ui.json {
            let _ = emit_json(&serde_json::json!({
                "event": "config_warning",
                "key": w.key,
                "file": w.file.display().to_string(),
                "line": w.line,
                "suggestion": w.suggestion,
            }));
            continue;
        }
        eprintln!("{} {}", Icon::Warning.colored(ui.color, ui.unicode), w);
    }
}

/// Write one JSON document to stdout as a single line.
pub fn emit_json<T: Serialize>(value: &T) -> io::Result<()> {
    let line = serde_json::to_string(value).map_err(io::Error::other)?;
    let mut out = io::stdout().lock();
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Final `result` event of a command in `--json` mode.
pub fn emit_result<T: Serialize>(command: &str, kind: docklift::ExitKind, report: &T) -> io::Result<()> {
    emit_json(&serde_json::json!({
        "event": "result",
        "command": command,
        "outcome": kind,
        "exit_code": kind.code(),
        "report": report,
    }))
}
