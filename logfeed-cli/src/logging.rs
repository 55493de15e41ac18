//! tracing subscriber setup.
//!
//! Logs always go to stderr; stdout is reserved for command output so
//! `logfeed --output json read ...` can be piped.

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use logfeed_core::config::GeneralConfig;

/// Install the global subscriber.
///
/// Filter precedence: `level_override` (the `--log-level` flag), then
/// `RUST_LOG`, then `general.log_level`. `general.log_format` selects
/// `json` lines or `pretty` output.
pub fn init_tracing(general: &GeneralConfig, level_override: Option<&str>) -> Result<()> {
    let filter = build_filter(general, level_override)?;

    let fmt = match general.log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .boxed(),
        other => bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt)
        .try_init()
        .context("tracing subscriber already installed")
}

fn build_filter(general: &GeneralConfig, level_override: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = level_override {
        return EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"));
    }
    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&general.log_level)))
}
