use docklift::application::StatusReport;

use crate::ui::primitives::icon::Icon;
use crate::ui::primitives::text::ColoredText;

fn check(ok: bool, label: &str, detail: &str, color: bool, unicode: bool) -> String {
    let icon = if ok { Icon::Success } else { Icon::Pending };
    format!(
        "  {} {:<12}{}\n",
        icon.colored(color, unicode),
        label,
        ColoredText::dim(detail).render(color)
    )
}

pub fn render_status(report: &StatusReport, supports_color: bool, supports_unicode: bool) -> String {
    let (c, u) = (supports_color, supports_unicode);
    let title = format!("{} ({})", report.app, report.domain);
    let mut out = format!(
        "{} {}\n",
        Icon::Remote.colored(c, u),
        ColoredText::info(title).bold().render(c)
    );

    out.push_str(&check(report.runtime, "runtime", "", c, u));
    out.push_str(&check(report.network, "network", "", c, u));
    out.push_str(&check(report.proxy_running, "proxy", "", c, u));
    out.push_str(&check(report.namespace, "namespace", "", c, u));
    out.push_str(&check(report.manifest, "manifest", "", c, u));

    let route_detail = match (&report.route, &report.expected_route) {
        (Some(actual), Some(expected)) if actual == expected => actual.clone(),
        (Some(actual), Some(expected)) => format!("{} (expected {})", actual, expected),
        (Some(actual), None) => actual.clone(),
        (None, _) => "not registered".to_string(),
    };
    out.push_str(&check(report.route_current(), "route", &route_detail, c, u));

    if report.containers.is_empty() {
        out.push_str(&check(false, "containers", "none", c, u));
    }
    for container in &report.containers {
        let running = container.state == "running";
        out.push_str(&check(running, &container.name, &container.status, c, u));
    }

    let verdict = if report.healthy() {
        ColoredText::success("healthy")
    } else if !report.base_ready() {
        ColoredText::warning("host not ready")
    } else {
        ColoredText::warning("degraded")
    };
    out.push_str(&format!("\n  {}\n", verdict.bold().render(c)));
    out
}
