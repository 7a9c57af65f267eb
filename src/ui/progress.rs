//! Human-readable progress for convergence runs.

use std::io::{self, Write};
use std::sync::Mutex;

use docklift::config::Verbosity;
use docklift::domain::ports::{ConvergeEvent, ConvergeEventSink};

use crate::ui::context::UiContext;
use crate::ui::primitives::icon::Icon;
use crate::ui::primitives::text::ColoredText;

/// Event sink that prints one line per stage to stderr.
pub struct ConsoleEventSink {
    ui: UiContext,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleEventSink {
    pub fn stderr(ui: UiContext) -> Self {
        Self::with_writer(ui, io::stderr())
    }

    pub fn with_writer<W: Write + Send + 'static>(ui: UiContext, writer: W) -> Self {
        Self {
            ui,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn shows(&self, level: Verbosity) -> bool {
        self.ui.verbosity >= level
    }

    fn line(&self, icon: Icon, text: String) {
        let icon = icon.colored(self.ui.color, self.ui.unicode);
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{} {}", icon, text);
            let _ = writer.flush();
        }
    }

    fn raw(&self, text: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", text);
        }
    }

    fn render_diff(&self, diff: &str) {
        for line in diff.lines() {
            let text = if line.starts_with('+') {
                ColoredText::success(line)
            } else if line.starts_with('-') {
                ColoredText::error(line)
            } else {
                ColoredText::dim(line)
            };
            self.raw(&format!("    {}", text.render(self.ui.color)));
        }
    }
}

impl ConvergeEventSink for ConsoleEventSink {
    fn on_event(&self, event: ConvergeEvent) {
        match event {
            ConvergeEvent::StageStarted { stage } => {
                if self.shows(Verbosity::Verbose) {
                    self.line(Icon::Progress, format!("{}...", stage.label()));
                }
            }
            ConvergeEvent::StageCompleted { stage, detail } => {
                if self.shows(Verbosity::Normal) {
                    let text = match detail {
                        Some(detail) => format!(
                            "{} {}",
                            stage.label(),
                            ColoredText::dim(format!("({})", detail)).render(self.ui.color)
                        ),
                        None => stage.label().to_string(),
                    };
                    self.line(Icon::Success, text);
                }
            }
            ConvergeEvent::StageSkipped { stage, reason } => {
                if self.shows(Verbosity::Normal) {
                    let text = format!(
                        "{} {}",
                        stage.label(),
                        ColoredText::dim(format!("({})", reason)).render(self.ui.color)
                    );
                    self.line(Icon::Skipped, text);
                }
            }
            ConvergeEvent::Command {
                command,
                privileged,
            } => {
                if self.shows(Verbosity::Debug) {
                    let prefix = if privileged { "# " } else { "$ " };
                    let text = ColoredText::dim(format!("{}{}", prefix, command));
                    self.raw(&format!("    {}", text.render(self.ui.color)));
                }
            }
            ConvergeEvent::RouteChanged {
                domain,
                change,
                diff,
            } => {
                if self.shows(Verbosity::Normal) {
                    let text = format!(
                        "route {} {}",
                        domain,
                        ColoredText::dim(format!("({})", change)).render(self.ui.color)
                    );
                    self.line(Icon::Arrow, text);
                }
                if let Some(diff) = diff.filter(|_| self.shows(Verbosity::Verbose)) {
                    self.render_diff(&diff);
                }
            }
            ConvergeEvent::Warning { message } => {
                self.line(
                    Icon::Warning,
                    ColoredText::warning(message).render(self.ui.color),
                );
            }
        }
    }

    fn wants_detailed_events(&self) -> bool {
        self.shows(Verbosity::Debug)
    }
}
