//! `logfeed routes` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logfeed_core::config::{LoaderMode, LogfeedConfig, RouteConfig};
use logfeed_core::source::LogSource;

use crate::cli::RoutesArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `routes` command.
pub async fn execute(
    args: RoutesArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = LogfeedConfig::load(config_path).await?;

    let report = match args.source {
        None => RoutesReport {
            source: None,
            routes: config
                .routes
                .iter()
                .enumerate()
                .map(|(index, route)| RouteEntry::new(index, route))
                .collect(),
        },
        Some(uri) => {
            let source = LogSource::parse_uri(&uri, &args.region)
                .map_err(|e| CliError::Command(format!("invalid source '{uri}': {e}")))?;
            info!(source = %source, "resolving route");
            RoutesReport {
                source: Some(source.to_string()),
                routes: match_route(&config, &source).into_iter().collect(),
            }
        }
    };

    writer.render(&report)
}

/// The first route whose pattern contains `source`, in registration order.
pub fn match_route(config: &LogfeedConfig, source: &LogSource) -> Option<RouteEntry> {
    config
        .routes
        .iter()
        .enumerate()
        .find(|(_, route)| route.pattern.contains(source))
        .map(|(index, route)| RouteEntry::new(index, route))
}

/// Route listing, or the match for a single source.
#[derive(Serialize)]
pub struct RoutesReport {
    /// Source being resolved (None = full listing)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub routes: Vec<RouteEntry>,
}

/// One configured route.
#[derive(Serialize)]
pub struct RouteEntry {
    pub index: usize,
    pub name: String,
    pub backend: &'static str,
    pub pattern: String,
    pub loader: String,
    pub parser: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_capacity: Option<usize>,
}

impl RouteEntry {
    fn new(index: usize, route: &RouteConfig) -> Self {
        let loader = match route.loader.mode {
            LoaderMode::Lines => format!("lines ({})", route.loader.compression),
            LoaderMode::WholeObject => format!("whole_object ({})", route.loader.compression),
            LoaderMode::Ignore => "ignore".to_owned(),
        };
        Self {
            index,
            name: route.display_name(),
            backend: route.pattern.backend(),
            pattern: route.pattern.to_string(),
            loader,
            parser: route.parser.format_name().to_owned(),
            channel_capacity: route.channel_capacity,
        }
    }
}

impl Render for RoutesReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(source) = &self.source {
            match self.routes.first() {
                Some(route) => writeln!(
                    w,
                    "{} -> #{} {}",
                    source.bold(),
                    route.index,
                    route.name.green()
                )?,
                None => {
                    writeln!(w, "{} -> {}", source.bold(), "no matching route".red())?;
                    return Ok(());
                }
            }
        } else {
            writeln!(w, "Routes ({}):", self.routes.len())?;
        }

        writeln!(
            w,
            "{:<4} {:<20} {:<8} {:<45} {:<22} {:<14}",
            "#", "Name", "Backend", "Pattern", "Loader", "Parser"
        )?;
        writeln!(w, "{}", "-".repeat(117))?;
        for r in &self.routes {
            writeln!(
                w,
                "{:<4} {:<20} {:<8} {:<45} {:<22} {:<14}",
                r.index, r.name, r.backend, r.pattern, r.loader, r.parser
            )?;
        }
        Ok(())
    }
}
