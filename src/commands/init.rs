use std::path::PathBuf;

use anyhow::Result;

use docklift::application::{InitRequest, InitUseCase};
use docklift::config::{ApplicationSection, SettingsDocument, VpsSection};
use docklift::infrastructure::YamlSpecRepository;
use docklift::{DockliftError, ExitKind};

use super::Session;
use crate::ui::output::emit_result;
use crate::ui::views::init::render_init_summary;

/// Values collected from `docklift init` flags.
#[derive(Debug, Clone)]
pub struct InitArgs {
    pub name: String,
    pub domain: String,
    pub port: Option<u16>,
    pub host: String,
    pub user: String,
    pub key: String,
    pub ssh_port: u16,
    pub email: Option<String>,
    pub dockerfile: String,
    pub context: String,
    pub force: bool,
}

impl InitArgs {
    fn into_document(self) -> SettingsDocument {
        SettingsDocument {
            vps: VpsSection {
                host: self.host,
                user: self.user,
                ssh_key_path: self.key,
                port: self.ssh_port,
                email: self.email,
            },
            application: ApplicationSection {
                name: self.name,
                domain: self.domain,
                dockerfile: self.dockerfile,
                context: self.context,
                port: self.port,
                environment: Default::default(),
                dependencies: Default::default(),
            },
        }
    }
}

pub fn cmd_init(session: &Session, document: PathBuf, args: InitArgs) -> Result<ExitKind> {
    let force = args.force;
    let outcome = InitUseCase::new(YamlSpecRepository::new())
        .init(InitRequest {
            path: document,
            document: args.into_document(),
            force,
        })
        .map_err(DockliftError::from)?;

    let ui = session.ui;
    if ui.json {
        emit_result("init", ExitKind::Success, &outcome)?;
    } else {
        session.print(&render_init_summary(&outcome, ui.color, ui.unicode));
    }
    Ok(ExitKind::Success)
}
