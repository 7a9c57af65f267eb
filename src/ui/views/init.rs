use docklift::application::InitOutcome;

use crate::ui::blocks::summary::ResultSummary;

pub fn render_init_summary(
    outcome: &InitOutcome,
    supports_color: bool,
    supports_unicode: bool,
) -> String {
    let title = if outcome.replaced {
        "Application document replaced"
    } else {
        "Application document written"
    };
    let mut summary = ResultSummary::success(title);
    summary.add_fact("File", outcome.path.display().to_string());
    let port = if outcome.allocated {
        format!("{} (allocated)", outcome.port)
    } else {
        outcome.port.to_string()
    };
    summary.add_fact("Port", port);
    summary.with_next_step("Run `docklift setup`, then `docklift deploy`");
    summary.render(supports_color, supports_unicode)
}
