//! Command handlers: load settings, wire adapters into use cases, render
//! the outcome. Each handler returns the exit class of a completed run;
//! failures propagate as `DockliftError` inside `anyhow`.

mod deploy;
mod init;
mod remove;
mod setup;
mod status;
mod unlock;

use std::path::Path;

use anyhow::Result;

use docklift::config::EngineConfig;
use docklift::domain::entities::Settings;
use docklift::domain::ports::{ConvergeEventSink, SpecRepository};
use docklift::infrastructure::{JsonEventSink, SshExecutor, YamlSpecRepository};
use docklift::DockliftError;

use crate::ui::context::UiContext;
use crate::ui::output::print_config_warnings;
use crate::ui::progress::ConsoleEventSink;

pub use deploy::cmd_deploy;
pub use init::{cmd_init, InitArgs};
pub use remove::cmd_remove;
pub use setup::cmd_setup;
pub use status::cmd_status;
pub use unlock::cmd_unlock;

/// Engine configuration and output settings shared by every command.
pub struct Session {
    pub config: EngineConfig,
    pub ui: UiContext,
}

impl Session {
    pub fn load(engine_config: Option<&Path>, json: bool, verbose: u8) -> Result<Self> {
        let (config, warnings) =
            EngineConfig::load_or_default(engine_config).map_err(DockliftError::from)?;
        let config = config.with_env_overrides();
        let ui = UiContext::new(json, verbose, &config);
        print_config_warnings(&ui, &warnings);
        Ok(Self { config, ui })
    }

    /// Progress sink for `command`: NDJSON on stdout or lines on stderr.
    pub fn events(&self, command: &'static str) -> Box<dyn ConvergeEventSink> {
        if self.ui.json {
            Box::new(JsonEventSink::stdout(command))
        } else {
            Box::new(ConsoleEventSink::stderr(self.ui))
        }
    }

    /// Print human output; `--json` keeps stdout for machine output only.
    pub fn print(&self, rendered: &str) {
        if !self.ui.json {
            eprint!("{}", rendered);
        }
    }
}

/// Load and validate the application document without touching its port.
fn load_settings(session: &Session, path: &Path) -> Result<Settings> {
    let repository = YamlSpecRepository::new();
    let loaded = repository.load(path);
    print_config_warnings(&session.ui, &repository.take_warnings());
    Ok(loaded.map_err(DockliftError::from)?)
}

fn executor(settings: &Settings) -> SshExecutor {
    SshExecutor::new(settings.host.clone())
}
