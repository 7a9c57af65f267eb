//! docklift CLI - idempotent single-host deployment
//!
//! Usage: docklift <COMMAND>
//!
//! Commands:
//!   init    Write an application document and assign a port
//!   setup   Prepare the host (runtime, network, reverse proxy)
//!   deploy  Build, start and route the application
//!   status  Show what is deployed
//!   remove  Take the application off the host
//!   unlock  Clear a stale host lock

mod cli;
mod commands;
mod ui;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Commands};
use commands::{InitArgs, Session};
use ui::terminal::detect_capabilities;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli) {
        Ok(kind) => ExitCode::from(kind.code() as u8),
        Err(err) => {
            let kind = ui::error::exit_kind(&err);
            if json {
                let _ = ui::output::emit_json(&serde_json::json!({
                    "event": "error",
                    "outcome": kind,
                    "exit_code": kind.code(),
                    "message": format!("{:#}", err),
                }));
            } else {
                let caps = detect_capabilities();
                eprint!(
                    "{}",
                    ui::error::format_error(&err, caps.supports_color, caps.supports_unicode)
                );
            }
            ExitCode::from(kind.code() as u8)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<docklift::ExitKind> {
    let session = Session::load(cli.engine_config.as_deref(), cli.json, cli.verbose)?;
    let document = cli.config;

    match cli.command {
        Commands::Init {
            name,
            domain,
            port,
            host,
            user,
            key,
            ssh_port,
            email,
            dockerfile,
            context,
            force,
        } => commands::cmd_init(
            &session,
            document,
            InitArgs {
                name,
                domain,
                port,
                host,
                user,
                key,
                ssh_port,
                email,
                dockerfile,
                context,
                force,
            },
        ),
        Commands::Setup => commands::cmd_setup(&session, &document),
        Commands::Deploy {
            skip_setup,
            skip_health_check,
        } => commands::cmd_deploy(&session, &document, skip_setup, skip_health_check),
        Commands::Status => commands::cmd_status(&session, &document),
        Commands::Remove { purge_volumes } => {
            commands::cmd_remove(&session, &document, purge_volumes)
        }
        Commands::Unlock => commands::cmd_unlock(&session, &document),
    }
}
