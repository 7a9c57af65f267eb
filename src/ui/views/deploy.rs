use docklift::application::{DeployReport, HealthStatus};

use crate::ui::blocks::header::CommandHeader;
use crate::ui::blocks::summary::ResultSummary;
use crate::ui::primitives::icon::Icon;

pub fn render_deploy_header(
    app: &str,
    domain: &str,
    host: &str,
    supports_color: bool,
    supports_unicode: bool,
) -> String {
    let mut header = CommandHeader::new(Icon::Deploy, format!("Deploying {}", app));
    header.add("Domain", domain);
    header.add("Host", host);
    header.render(supports_color, supports_unicode)
}

pub fn format_bytes_compact(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        return format!("{} B", bytes);
    }
    if b < MB {
        return format!("{:.1} KB", b / KB);
    }
    if b < GB {
        return format!("{:.1} MB", b / MB);
    }
    format!("{:.1} GB", b / GB)
}

fn health_line(health: &HealthStatus) -> String {
    match health {
        HealthStatus::Healthy { code, attempts } => {
            format!("HTTP {} after {} attempt(s)", code, attempts)
        }
        HealthStatus::Responding { code, attempts } => {
            format!("responding with HTTP {} after {} attempt(s)", code, attempts)
        }
        HealthStatus::TimedOut { attempts } => {
            format!("no answer after {} attempt(s)", attempts)
        }
        HealthStatus::Skipped => "skipped".to_string(),
    }
}

pub fn render_deploy_summary(
    report: &DeployReport,
    supports_color: bool,
    supports_unicode: bool,
) -> String {
    let title = format!("Deployed {}", report.app);
    let mut summary = if report.kind().is_success() && report.warnings.is_empty() {
        ResultSummary::success(title)
    } else {
        ResultSummary::partial(title)
    };

    summary.add_fact("URL", format!("https://{}", report.domain));
    summary.add_fact("Upstream", report.upstream.as_str());
    summary.add_fact(
        "Context",
        format!(
            "{} files, {} ({})",
            report.context_files,
            format_bytes_compact(report.context_bytes),
            report.context_digest
        ),
    );
    summary.add_fact("Health", health_line(&report.health));
    summary.add_fact("Route", report.route_change.as_str());

    for warning in &report.warnings {
        summary.add_warning(warning.as_str());
    }
    if matches!(report.health, HealthStatus::TimedOut { .. }) {
        summary.with_next_step("Run `docklift status` to inspect the containers");
    }

    summary.render(supports_color, supports_unicode)
}
