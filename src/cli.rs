use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// docklift - converge one containerized app onto one host
#[derive(Parser, Debug)]
#[command(name = "docklift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Application document
    #[arg(short, long, global = true, default_value = "docklift.yml")]
    pub config: PathBuf,

    /// Engine configuration file (defaults to the user config)
    #[arg(long, global = true)]
    pub engine_config: Option<PathBuf>,

    /// Output format for CI
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an application document and assign a port
    Init {
        /// Application name
        #[arg(long)]
        name: String,

        /// Public domain served by the proxy
        #[arg(long)]
        domain: String,

        /// Internal port (allocated from the workspace when omitted)
        #[arg(long)]
        port: Option<u16>,

        /// Host name or address
        #[arg(long)]
        host: String,

        /// SSH user
        #[arg(long, default_value = "root")]
        user: String,

        /// SSH private key
        #[arg(long, default_value = "~/.ssh/id_rsa")]
        key: String,

        /// SSH port
        #[arg(long, default_value_t = 22)]
        ssh_port: u16,

        /// ACME contact address for certificates
        #[arg(long)]
        email: Option<String>,

        /// Dockerfile, relative to the build context
        #[arg(long, default_value = "./Dockerfile")]
        dockerfile: String,

        /// Build context, relative to the document
        #[arg(long, default_value = ".")]
        context: String,

        /// Replace an existing document
        #[arg(short, long)]
        force: bool,
    },

    /// Prepare the host: container runtime, network, reverse proxy
    Setup,

    /// Build and start the application and route its domain to it
    Deploy {
        /// Skip host preparation (fails if the host is not ready)
        #[arg(long)]
        skip_setup: bool,

        /// Do not wait for the application to answer
        #[arg(long)]
        skip_health_check: bool,
    },

    /// Show what is deployed for the application
    Status,

    /// Take the application off the host
    Remove {
        /// Also delete the application's named volumes
        #[arg(long)]
        purge_volumes: bool,
    },

    /// Clear a host lock left behind by an interrupted run
    Unlock,
}
