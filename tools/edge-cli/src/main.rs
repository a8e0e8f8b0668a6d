//! Edge CLI - Command line tool to inspect page config resolution and loading.
//!
//! Commands:
//! - `edge inspect` - Load one page from a build manifest and show what it resolves to
//! - `edge config` - Show the resolved framework configuration

mod commands;
mod context;
mod manifest;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{ConfigArgs, InspectArgs};

/// Edge CLI - Inspect page config resolution and loading
#[derive(Parser)]
#[command(name = "edge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a page from a build manifest and show its config and exports
    Inspect(InspectArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

fn default_log_directives(verbose: bool) -> &'static str {
    if verbose {
        "edge_config=trace,edge_loader=trace,warn"
    } else {
        "warn"
    }
}

/// Library diagnostics go to stderr so JSON output stays parseable.
/// `RUST_LOG` overrides the level picked from `--verbose`.
fn init_tracing(verbose: bool) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_directives(verbose))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Inspect(args) => commands::inspect::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
