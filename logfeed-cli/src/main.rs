//! logfeed -- command-line front end for the log reader.
//!
//! Loads `logfeed.toml`, initializes logging, and dispatches to the
//! subcommand handlers. Errors map to process exit codes via
//! [`CliError::exit_code`](error::CliError::exit_code).

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use logfeed_core::config::{GeneralConfig, LogfeedConfig};

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // an unreadable config still gets logging; the command reports the error
    let general = LogfeedConfig::load(&cli.config)
        .await
        .map(|config| config.general)
        .unwrap_or_else(|_| GeneralConfig::default());

    if let Err(e) = logging::init_tracing(&general, cli.log_level.as_deref()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    logfeed_core::metrics::describe_all();
    tracing::debug!(config = %cli.config.display(), "logfeed starting");

    if let Err(e) = run(cli).await {
        tracing::debug!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Read(args) => commands::read::execute(args, &cli.config, &writer).await,
        Commands::Routes(args) => commands::routes::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
