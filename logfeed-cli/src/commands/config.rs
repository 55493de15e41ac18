//! `logfeed config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use logfeed_core::config::{LogfeedConfig, RouteConfig};

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
const SECTIONS: [&str; 3] = ["general", "reader", "routes"];

pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => validate(config_path, writer).await,
        ConfigAction::Show { section } => show(config_path, section.as_deref(), writer).await,
    }
}

/// Validate the file and report shadowed routes.
///
/// Shadowed routes are warnings only; the command fails with
/// `CliError::Config` only when loading or validation fails.
async fn validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let mut report = ValidationReport {
        path: config_path.display().to_string(),
        valid: false,
        routes: Vec::new(),
        warnings: Vec::new(),
        error: None,
    };

    match LogfeedConfig::load(config_path).await {
        Ok(config) => {
            report.valid = true;
            report.routes = config.routes.iter().map(RouteConfig::display_name).collect();
            report.warnings = shadowed_routes(&config)
                .into_iter()
                .map(|(later, earlier)| {
                    format!(
                        "route #{later} '{}' is unreachable: route #{earlier} '{}' matches first",
                        report.routes[later], report.routes[earlier]
                    )
                })
                .collect();
            for warning in &report.warnings {
                warn!(path = %config_path.display(), "{warning}");
            }
        }
        Err(e) => report.error = Some(e.to_string()),
    }

    writer.render(&report)?;

    match report.error {
        Some(reason) => Err(CliError::Config(reason)),
        None => Ok(()),
    }
}

async fn show(
    config_path: &Path,
    section: Option<&str>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = LogfeedConfig::load(config_path).await?;
    let view = effective_config(&config, config_path, section)?;
    writer.render(&view)
}

/// Pairs `(later, earlier)` where route `later` can never be selected because
/// the pattern of route `earlier` already covers every source it matches.
pub fn shadowed_routes(config: &LogfeedConfig) -> Vec<(usize, usize)> {
    let routes = &config.routes;
    (1..routes.len())
        .filter_map(|later| {
            routes[..later]
                .iter()
                .position(|earlier| earlier.pattern.contains(&routes[later].pattern))
                .map(|earlier| (later, earlier))
        })
        .collect()
}

/// The loaded configuration (after env overrides), whole or one section.
pub fn effective_config(
    config: &LogfeedConfig,
    config_path: &Path,
    section: Option<&str>,
) -> Result<EffectiveConfig, CliError> {
    let (value, toml) = match section {
        None => encode(config)?,
        Some("general") => encode(&config.general)?,
        Some("reader") => encode(&config.reader)?,
        // a bare array is not a TOML document
        Some("routes") => encode(&RoutesTable {
            routes: &config.routes,
        })?,
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section '{other}', expected one of: {}",
                SECTIONS.join(", ")
            )));
        }
    };

    Ok(EffectiveConfig {
        path: config_path.display().to_string(),
        section: section.map(str::to_owned),
        value,
        toml,
    })
}

#[derive(Serialize)]
struct RoutesTable<'a> {
    routes: &'a [RouteConfig],
}

fn encode<T: Serialize>(part: &T) -> Result<(serde_json::Value, String), CliError> {
    let toml = toml::to_string_pretty(part)
        .map_err(|e| CliError::Command(format!("cannot render configuration as TOML: {e}")))?;
    Ok((serde_json::to_value(part)?, toml))
}

/// `config show` payload.
#[derive(Serialize)]
pub struct EffectiveConfig {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub value: serde_json::Value,
    /// Text form; JSON output carries `value` instead.
    #[serde(skip)]
    pub toml: String,
}

impl Render for EffectiveConfig {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        // comment lines keep the output a loadable TOML document
        let scope = match &self.section {
            Some(section) => format!("[{section}] of {}", self.path),
            None => self.path.clone(),
        };
        writeln!(w, "{}", format!("# effective configuration: {scope}").dimmed())?;
        write!(w, "{}", self.toml)
    }
}

/// `config validate` payload.
#[derive(Serialize)]
pub struct ValidationReport {
    pub path: String,
    pub valid: bool,
    /// Route names in match order
    pub routes: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Render for ValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.error {
            Some(reason) => {
                writeln!(w, "{} {}", self.path.bold(), "invalid".red().bold())?;
                writeln!(w, "  {reason}")?;
                return Ok(());
            }
            None => writeln!(
                w,
                "{} {} ({} routes)",
                self.path.bold(),
                "ok".green().bold(),
                self.routes.len()
            )?,
        }

        for (index, name) in self.routes.iter().enumerate() {
            writeln!(w, "  #{index} {name}")?;
        }
        for warning in &self.warnings {
            writeln!(w, "  {} {warning}", "warning:".yellow())?;
        }
        Ok(())
    }
}
