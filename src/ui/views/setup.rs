use docklift::application::InfraReport;

use crate::ui::blocks::header::CommandHeader;
use crate::ui::blocks::summary::ResultSummary;
use crate::ui::primitives::icon::Icon;

pub fn render_setup_header(
    host: &str,
    network: &str,
    supports_color: bool,
    supports_unicode: bool,
) -> String {
    let mut header = CommandHeader::new(Icon::Remote, "Preparing host");
    header.add("Host", host);
    header.add("Network", network);
    header.render(supports_color, supports_unicode)
}

pub fn render_setup_summary(
    report: &InfraReport,
    supports_color: bool,
    supports_unicode: bool,
) -> String {
    let mut summary = if report.changed() {
        ResultSummary::success("Host is ready")
    } else {
        ResultSummary::success("Host was already ready")
    };

    let mut changes = Vec::new();
    if report.runtime_installed {
        changes.push("installed container runtime");
    }
    if report.network_created {
        changes.push("created network");
    }
    if report.routing_document_created {
        changes.push("created routing document");
    }
    if report.proxy_started {
        changes.push("started reverse proxy");
    }
    if !changes.is_empty() {
        summary.add_fact("Changes", changes.join(", "));
    }
    summary.with_next_step("Run `docklift deploy`");

    summary.render(supports_color, supports_unicode)
}
