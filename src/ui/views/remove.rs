use docklift::application::RemoveReport;

use crate::ui::blocks::summary::ResultSummary;

fn yes_no(done: bool, yes: &'static str, no: &'static str) -> &'static str {
    if done {
        yes
    } else {
        no
    }
}

pub fn render_remove_summary(
    report: &RemoveReport,
    supports_color: bool,
    supports_unicode: bool,
) -> String {
    let mut summary = ResultSummary::success(format!("Removed {}", report.app));
    summary.add_fact(
        "Route",
        yes_no(report.route_removed, "removed", "was not registered"),
    );
    summary.add_fact(
        "Containers",
        yes_no(report.containers_removed, "stopped and removed", "none found"),
    );
    summary.add_fact(
        "Volumes",
        yes_no(report.volumes_purged, "purged", "kept"),
    );
    summary.add_fact(
        "Namespace",
        yes_no(report.namespace_removed, "deleted", "was already gone"),
    );
    summary.render(supports_color, supports_unicode)
}
