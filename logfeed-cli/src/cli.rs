//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// logfeed -- read log objects from storage as structured records.
///
/// Use `logfeed <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logfeed", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logfeed.toml configuration file.
    #[arg(short, long, default_value = "logfeed.toml", global = true)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read objects through the configured routes and print their records.
    Read(ReadArgs),

    /// List routes, or show which route a source would take.
    Routes(RoutesArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

/// Default region for `s3://` URIs.
pub const DEFAULT_REGION: &str = "us-east-1";

// ---- read ----

/// Read one or more sources.
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Local directory standing in for object storage (`<root>/<bucket>/<key>`).
    /// Without it only file sources can be read.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Region assigned to `s3://` URIs.
    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,

    /// Source URIs (`s3://bucket/key`, `file:///path` or a bare path).
    #[arg(required = true, num_args = 1..)]
    pub sources: Vec<String>,
}

// ---- routes ----

/// Inspect configured routes.
#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Region assigned to an `s3://` URI.
    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,

    /// Show the first route matching this URI instead of the full list.
    pub source: Option<String>,
}

// ---- config ----

/// Manage logfeed configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, reader, routes).
        #[arg(long)]
        section: Option<String>,
    },
}
