use docklift::config::ConfigError;
use docklift::{DockliftError, ExitKind};

use crate::ui::primitives::icon::Icon;
use crate::ui::primitives::text::ColoredText;

/// Exit class of whatever error reached `main`.
pub fn exit_kind(err: &anyhow::Error) -> ExitKind {
    if let Some(docklift) = err.downcast_ref::<DockliftError>() {
        return docklift.kind();
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return ExitKind::Validation;
    }
    ExitKind::Failure
}

pub fn format_error(err: &anyhow::Error, supports_color: bool, supports_unicode: bool) -> String {
    let kind = exit_kind(err);
    let mut out = format!(
        "{} {}\n",
        Icon::Error.colored(supports_color, supports_unicode),
        ColoredText::error(format!("{}: {}", kind.label(), err))
            .bold()
            .render(supports_color)
    );
    for cause in err.chain().skip(1) {
        out.push_str(&format!("  caused by: {}\n", cause));
    }
    if let Some(hint) = hint(kind) {
        out.push_str(&format!(
            "  {} {}\n",
            Icon::Arrow.colored(supports_color, supports_unicode),
            ColoredText::dim(hint).render(supports_color)
        ));
    }
    out
}

fn hint(kind: ExitKind) -> Option<&'static str> {
    match kind {
        ExitKind::Validation => Some("Fix the application document and run again."),
        ExitKind::InfraNotReady => Some("Run `docklift setup` to prepare the host."),
        ExitKind::RoutingConflict => {
            Some("Repair the routing document on the host; it is left untouched.")
        }
        ExitKind::RemoteUnreachable => Some("Check the host address, ssh key and port."),
        ExitKind::HostLocked => {
            Some("If no other run is active, clear the lock with `docklift unlock`.")
        }
        ExitKind::BuildFailed | ExitKind::StartFailed => {
            Some("Previous containers keep running; fix the cause and deploy again.")
        }
        _ => None,
    }
}
