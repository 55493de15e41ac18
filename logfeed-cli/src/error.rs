//! CLI-specific error types and exit code mapping

use logfeed_core::error::LogfeedError;
use logfeed_pipeline::LogPipelineError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed (bad URI, unknown section, ...).
    #[error("{0}")]
    Command(String),

    /// One or more sources ended with an error item.
    #[error("{failed} of {total} sources failed")]
    Read { failed: usize, total: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logfeed-core.
    #[error("{0}")]
    Core(#[from] LogfeedError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 0    | Success                         |
    /// | 1    | General / command error         |
    /// | 2    | Configuration error             |
    /// | 3    | At least one source failed      |
    /// | 10   | IO error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(LogfeedError::Config(_)) => 2,
            Self::Read { .. } => 3,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<LogPipelineError> for CliError {
    fn from(e: LogPipelineError) -> Self {
        Self::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logfeed_core::error::ConfigError;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_core_config_error() {
        let err: CliError = LogfeedError::Config(ConfigError::FileNotFound {
            path: "logfeed.toml".to_owned(),
        })
        .into();
        assert_eq!(err.exit_code(), 2, "core config errors are configuration errors");
    }

    #[test]
    fn test_exit_code_read_failure() {
        let err = CliError::Read {
            failed: 1,
            total: 3,
        };
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "1 of 3 sources failed");
    }

    #[test]
    fn test_exit_code_io_error() {
        let err = CliError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe"));
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("bad uri".to_owned());
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "bad uri");
    }

    #[test]
    fn test_from_pipeline_error() {
        let err: CliError = LogPipelineError::Route {
            route: "vpc".to_owned(),
            reason: "channel_capacity must be between 1 and 1000000".to_owned(),
        }
        .into();
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().contains("vpc"));
    }
}
