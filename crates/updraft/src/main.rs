//! updraft CLI - signed update manifests
//!
//! Entry point for the operator command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Generate(args) => commands::generate::run(args, config),
        Commands::Verify(args) => commands::verify::run(args, config),
        Commands::Deploy(args) => commands::deploy::run(args, config).await,
        Commands::Serve(args) => commands::serve::run(args, config).await,
        Commands::Keys(cmd) => commands::keys::run(cmd, config),
        Commands::Check(args) => commands::check::run(args, config).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
