//! Integration tests for `logfeed` configuration loading and the binary.
//!
//! Library-level tests load real TOML files; the command tests run the
//! built `logfeed` binary against a temporary storage root.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;

use tempfile::TempDir;

use logfeed_core::config::LogfeedConfig;
use logfeed_core::source::LogSource;
use logfeed_pipeline::{InMemoryFetcher, LogReader};

const APP_CONFIG: &str = r#"
[general]
log_level = "warn"
log_format = "json"

[[routes]]
name = "app"
pattern = { backend = "s3", region = "us-east-1", bucket = "logs", prefix = "app/" }
loader = { mode = "lines" }
parser = { format = "json", tag = "app.log", timestamp = { kind = "rfc3339", field = "time" } }

[[routes]]
name = "digest"
pattern = { backend = "s3", region = "us-east-1", bucket = "logs", prefix = "digest/" }
loader = { mode = "ignore" }
parser = { format = "raw" }
"#;

fn write_config(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("should write config");
    path
}

fn logfeed(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_logfeed"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("LOGFEED_GENERAL_LOG_LEVEL")
        .env_remove("LOGFEED_READER_CHANNEL_CAPACITY")
        .output()
        .expect("should run logfeed binary")
}

#[tokio::test]
async fn test_config_load_valid_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = write_config(&temp_dir, "logfeed.toml", APP_CONFIG);

    let config = LogfeedConfig::load(&path).await.expect("valid config");
    assert_eq!(config.routes.len(), 2);
    assert_eq!(config.routes[0].display_name(), "app");
    assert_eq!(config.general.log_level, "warn");
}

#[tokio::test]
async fn test_config_load_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = write_config(&temp_dir, "bad.toml", "[general\nlog_level = \"info\"\n");

    let err = LogfeedConfig::load(&path).await.unwrap_err();
    assert_eq!(err.kind(), "config");
}

#[tokio::test]
async fn test_config_load_missing_file() {
    let result = LogfeedConfig::load("/nonexistent/logfeed.toml").await;
    assert!(result.is_err(), "missing file should fail to load");
}

#[tokio::test]
async fn test_config_load_empty_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = write_config(&temp_dir, "empty.toml", "");

    let config = LogfeedConfig::load(&path).await.expect("empty config is valid");
    assert!(config.routes.is_empty());
    assert_eq!(config.general.log_level, "info");
}

#[tokio::test]
async fn test_config_missing_parser_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = write_config(
        &temp_dir,
        "noparser.toml",
        r#"
[[routes]]
pattern = { backend = "file", path = "/var/log/" }
"#,
    );

    assert!(LogfeedConfig::load(&path).await.is_err());
}

#[tokio::test]
async fn test_example_config_builds_reader() {
    let config = LogfeedConfig::parse(include_str!("../../logfeed.toml.example"))
        .expect("example config parses");
    config.validate().expect("example config is valid");

    let reader = LogReader::from_config(&config, Arc::new(InMemoryFetcher::new()))
        .expect("reader builds");
    assert_eq!(reader.routes().len(), config.routes.len());

    let digest = LogSource::s3(
        "ap-northeast-1",
        "example-logs",
        "AWSLogs/123456789012/CloudTrail-Digest/2024/01/01/digest.json.gz",
    );
    let mut rx = reader.read(digest);
    assert!(rx.recv().await.is_none(), "digest route ignores objects");
}

#[test]
fn test_binary_config_validate() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let good = write_config(&temp_dir, "logfeed.toml", APP_CONFIG);
    let bad = write_config(
        &temp_dir,
        "bad.toml",
        "[reader]\nchannel_capacity = 0\n",
    );

    let ok = logfeed(&good, &["config", "validate"]);
    assert!(ok.status.success());
    assert!(String::from_utf8_lossy(&ok.stdout).contains("(2 routes)"));

    let failed = logfeed(&bad, &["--output", "json", "config", "validate"]);
    assert_eq!(failed.status.code(), Some(2));
    let report: serde_json::Value =
        serde_json::from_slice(&failed.stdout).expect("json report on stdout");
    assert_eq!(report["valid"], false);
    assert!(
        report["error"]
            .as_str()
            .expect("error message")
            .contains("reader.channel_capacity")
    );
}

#[test]
fn test_binary_read_json_output() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = write_config(&temp_dir, "logfeed.toml", APP_CONFIG);

    let root = temp_dir.path().join("storage");
    fs::create_dir_all(root.join("logs/app")).expect("should create bucket dir");
    fs::write(
        root.join("logs/app/2024-01-01.log"),
        concat!(
            r#"{"time":"2024-01-01T00:00:00Z","msg":"start"}"#,
            "\n",
            r#"{"time":"2024-01-01T00:00:05Z","msg":"stop"}"#,
            "\n",
        ),
    )
    .expect("should write object");

    let output = logfeed(
        &config,
        &[
            "--output",
            "json",
            "read",
            "--root",
            root.to_str().expect("utf-8 path"),
            "s3://logs/app/2024-01-01.log",
        ],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    let source = &report["sources"][0];
    assert_eq!(source["source"], "s3://logs/app/2024-01-01.log");
    let records = source["records"].as_array().expect("records array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["tag"], "app.log");
    assert_eq!(records[0]["value"]["msg"], "start");
    assert_eq!(records[1]["seq"], 1);
    assert!(source.get("error").is_none());
}

#[test]
fn test_binary_read_without_root_serves_files_only() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let log_dir = temp_dir.path().join("var/log");
    fs::create_dir_all(&log_dir).expect("should create log dir");
    fs::write(log_dir.join("app.log"), "plain line\n").expect("should write log");
    let config = write_config(
        &temp_dir,
        "logfeed.toml",
        &format!(
            "{APP_CONFIG}\n[[routes]]\npattern = {{ backend = \"file\", path = \"{}/\" }}\nparser = {{ format = \"raw\" }}\n",
            log_dir.display()
        ),
    );
    let file = log_dir.join("app.log");

    let output = logfeed(
        &config,
        &[
            "--output",
            "json",
            "read",
            file.to_str().expect("utf-8 path"),
            "s3://logs/app/2024-01-01.log",
        ],
    );
    assert_eq!(output.status.code(), Some(3));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    let file_source = &report["sources"][0];
    assert_eq!(file_source["records"].as_array().expect("records").len(), 1);
    assert!(file_source.get("error").is_none());

    let s3_source = &report["sources"][1];
    assert_eq!(s3_source["error"]["kind"], "fetch");
    assert!(
        s3_source["error"]["message"]
            .as_str()
            .expect("message")
            .contains("unsupported source backend: s3")
    );
}

#[test]
fn test_binary_read_reports_failed_sources() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = write_config(&temp_dir, "logfeed.toml", APP_CONFIG);
    let root = temp_dir.path().join("storage");
    fs::create_dir_all(&root).expect("should create root");

    let output = logfeed(
        &config,
        &[
            "--output",
            "json",
            "read",
            "--root",
            root.to_str().expect("utf-8 path"),
            "s3://logs/app/missing.log",
            "s3://other/x.log",
        ],
    );
    assert_eq!(output.status.code(), Some(3));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(report["sources"][0]["error"]["kind"], "fetch");
    assert_eq!(report["sources"][1]["error"]["kind"], "no_matching_rule");
}
