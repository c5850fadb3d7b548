//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Command needs a live browser but the binary was built without one
    #[error("'{command}' needs a live browser; rebuild with --features browser")]
    BrowserUnavailable {
        /// Command that was refused
        command: String,
    },

    /// Probed locator matched nothing
    #[error("Locator '{name}' could not be resolved after {attempts} attempts")]
    Unresolved {
        /// Locator name
        name: String,
        /// Strategies tried
        attempts: usize,
    },

    /// Shopping flow stopped at a failing step
    #[error("Shopping flow failed at step '{step}': {detail}")]
    FlowFailed {
        /// Step that failed
        step: String,
        /// Step detail
        detail: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Smartprobe library error
    #[error("Smartprobe error: {0}")]
    Probe(#[from] smartprobe::ProbeError),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML rendering error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a browser-unavailable error
    #[must_use]
    pub fn browser_unavailable(command: impl Into<String>) -> Self {
        Self::BrowserUnavailable {
            command: command.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_browser_unavailable_names_feature() {
        let err = CliError::browser_unavailable("probe");
        assert_eq!(
            err.to_string(),
            "'probe' needs a live browser; rebuild with --features browser"
        );
    }

    #[test]
    fn test_unresolved_error() {
        let err = CliError::Unresolved {
            name: "Cart Icon".to_string(),
            attempts: 3,
        };
        assert!(err.to_string().contains("'Cart Icon'"));
        assert!(err.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_probe_error_from() {
        let err: CliError = smartprobe::ProbeError::config("zero retries").into();
        assert!(err.to_string().starts_with("Smartprobe error:"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}
