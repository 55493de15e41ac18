//! `logfeed read` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use logfeed_core::config::LogfeedConfig;
use logfeed_core::source::LogSource;
use logfeed_core::types::LogRecord;
use logfeed_pipeline::{LocalFsFetcher, LogReader};

use crate::cli::ReadArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `read` command.
///
/// All sources are started before any is drained, so they run concurrently;
/// output is still grouped per source in argument order.
pub async fn execute(
    args: ReadArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = LogfeedConfig::load(config_path).await?;
    let fetcher = Arc::new(match &args.root {
        Some(root) => LocalFsFetcher::new(root),
        None => LocalFsFetcher::files_only(),
    });
    let sources = parse_sources(&args.sources, &args.region)?;
    info!(
        root = ?fetcher.root(),
        sources = sources.len(),
        "reading sources"
    );
    let reader = LogReader::from_config(&config, fetcher)?;

    let streams: Vec<_> = sources
        .into_iter()
        .map(|source| (source.to_string(), reader.read(source)))
        .collect();

    let mut reports = Vec::with_capacity(streams.len());
    for (location, mut rx) in streams {
        let mut report = SourceReport {
            source: location,
            records: Vec::new(),
            error: None,
        };
        while let Some(item) = rx.recv().await {
            match item {
                Ok(record) => report.records.push(RecordEntry::from(&record)),
                Err(err) => {
                    report.error = Some(ErrorEntry {
                        kind: err.kind().to_owned(),
                        message: err.to_string(),
                    });
                }
            }
        }
        reports.push(report);
    }

    let report = ReadReport { sources: reports };
    writer.render(&report)?;

    let failed = report.failed();
    if failed > 0 {
        return Err(CliError::Read {
            failed,
            total: report.sources.len(),
        });
    }
    Ok(())
}

/// Parse source URIs, failing on the first invalid one.
pub fn parse_sources(uris: &[String], region: &str) -> Result<Vec<LogSource>, CliError> {
    uris.iter()
        .map(|uri| {
            LogSource::parse_uri(uri, region)
                .map_err(|e| CliError::Command(format!("invalid source '{uri}': {e}")))
        })
        .collect()
}

/// Result of reading every requested source.
#[derive(Serialize)]
pub struct ReadReport {
    pub sources: Vec<SourceReport>,
}

impl ReadReport {
    /// Number of sources that ended with an error.
    pub fn failed(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }
}

/// Records and terminal error of one source.
#[derive(Serialize)]
pub struct SourceReport {
    pub source: String,
    pub records: Vec<RecordEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEntry>,
}

/// One decoded record.
#[derive(Serialize)]
pub struct RecordEntry {
    pub tag: String,
    pub timestamp: String,
    pub seq: u64,
    pub value: serde_json::Value,
}

impl From<&LogRecord> for RecordEntry {
    fn from(record: &LogRecord) -> Self {
        Self {
            tag: record.tag.clone(),
            timestamp: record.timestamp.to_rfc3339(),
            seq: record.seq,
            value: record.value.clone(),
        }
    }
}

/// Terminal error of a source.
#[derive(Serialize)]
pub struct ErrorEntry {
    pub kind: String,
    pub message: String,
}

impl Render for ReadReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for source in &self.sources {
            writeln!(
                w,
                "{} ({} records)",
                source.source.bold(),
                source.records.len()
            )?;
            for r in &source.records {
                writeln!(
                    w,
                    "  {} {} #{} {}",
                    r.tag.cyan(),
                    r.timestamp,
                    r.seq,
                    r.value
                )?;
            }
            if let Some(err) = &source.error {
                writeln!(w, "  {} [{}] {}", "ERROR".red().bold(), err.kind, err.message.red())?;
            }
        }
        Ok(())
    }
}
