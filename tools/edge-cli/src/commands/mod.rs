//! CLI command implementations.

pub mod config;
pub mod inspect;

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use edge_core::Environment;

/// Environment selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EnvArg {
    Client,
    Server,
}

impl From<EnvArg> for Environment {
    fn from(env: EnvArg) -> Self {
        match env {
            EnvArg::Client => Environment::Client,
            EnvArg::Server => Environment::Server,
        }
    }
}

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Build manifest (JSON).
    pub manifest: PathBuf,

    /// Page to load.
    pub page_id: String,

    /// Environment to load the page in.
    #[arg(short, long, value_enum, default_value = "server")]
    pub env: EnvArg,

    /// Load in development mode, whatever the configuration says.
    #[arg(long)]
    pub dev: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration (file and environment).
    Show,
    /// Show which config file is in use.
    Path,
}
