//! Result and error types for Smartprobe.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for Smartprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur in Smartprobe
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Every attempted strategy of a named locator failed
    #[error(
        "Could not find element '{name}' after {attempts} attempts. Screenshot: {}",
        artifact_display(.artifact)
    )]
    ElementNotFound {
        /// Locator name
        name: String,
        /// Number of strategies tried
        attempts: usize,
        /// Failure screenshot, if one was captured
        artifact: Option<PathBuf>,
    },

    /// Operation timed out
    #[error("Timeout: operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Strategy kind tag not recognised
    #[error("Unsupported strategy kind: {kind}")]
    UnsupportedStrategyKind {
        /// The offending tag
        kind: String,
    },

    /// Strategy payload could not be turned into a query
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector {
        /// Raw selector payload
        selector: String,
        /// Error message
        message: String,
    },

    /// Browser driver error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Script evaluation error
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Browser session error
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Test data error
    #[error("Test data error: {message}")]
    Data {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

fn artifact_display(artifact: &Option<PathBuf>) -> String {
    artifact.as_deref().map_or_else(|| "None".to_string(), |p: &Path| p.display().to_string())
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an invalid selector error
    #[must_use]
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Create a navigation error
    #[must_use]
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a screenshot error
    #[must_use]
    pub fn screenshot(message: impl Into<String>) -> Self {
        Self::Screenshot {
            message: message.into(),
        }
    }

    /// Create a script evaluation error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a test data error
    #[must_use]
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Whether this error is the wait-expiry signal
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_with_artifact() {
        let err = ProbeError::ElementNotFound {
            name: "Search Button".to_string(),
            attempts: 3,
            artifact: Some(PathBuf::from("reports/screenshots/fail.png")),
        };
        let msg = err.to_string();
        assert!(msg.contains("'Search Button'"));
        assert!(msg.contains("after 3 attempts"));
        assert!(msg.ends_with("Screenshot: reports/screenshots/fail.png"));
    }

    #[test]
    fn test_element_not_found_without_artifact() {
        let err = ProbeError::ElementNotFound {
            name: "Cart Icon".to_string(),
            attempts: 0,
            artifact: None,
        };
        assert!(err.to_string().ends_with("Screenshot: None"));
    }

    #[test]
    fn test_timeout_is_distinguished() {
        assert!(ProbeError::Timeout { ms: 5000 }.is_timeout());
        assert!(ProbeError::Timeout { ms: 5000 }.to_string().starts_with("Timeout"));
        assert!(!ProbeError::driver("boom").is_timeout());
    }

    #[test]
    fn test_constructors() {
        assert!(ProbeError::invalid_selector("role[", "unterminated")
            .to_string()
            .contains("role["));
        assert!(ProbeError::navigation("https://x", "refused")
            .to_string()
            .contains("https://x"));
        assert!(ProbeError::config("bad").to_string().contains("Configuration"));
        assert!(ProbeError::session("gone").to_string().contains("Session"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ProbeError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
