//! CLI configuration

use serde::{Deserialize, Serialize};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - debug logging
    Verbose,
    /// Debug - trace logging
    Debug,
}

impl Verbosity {
    /// From the `-v` count and `-q` flag; quiet wins
    #[must_use]
    pub const fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Log filter for this level; `Normal` keeps the configured one
    #[must_use]
    pub fn log_level<'a>(self, configured: &'a str) -> &'a str {
        match self {
            Self::Quiet => "error",
            Self::Normal => configured,
            Self::Verbose => "debug",
            Self::Debug => "trace",
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Colored output
    pub color: bool,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Enable colors when stdout is a terminal
    #[must_use]
    pub fn with_auto_color(mut self) -> Self {
        self.color = console::Term::stdout().features().colors_supported();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(0, false), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(4, false), Verbosity::Debug);
            assert_eq!(Verbosity::from_flags(2, true), Verbosity::Quiet);
        }

        #[test]
        fn test_predicates() {
            assert!(Verbosity::Quiet.is_quiet());
            assert!(!Verbosity::Normal.is_verbose());
            assert!(Verbosity::Debug.is_verbose());
        }

        #[test]
        fn test_log_level() {
            assert_eq!(Verbosity::Quiet.log_level("info"), "error");
            assert_eq!(Verbosity::Normal.log_level("warn"), "warn");
            assert_eq!(Verbosity::Verbose.log_level("info"), "debug");
            assert_eq!(Verbosity::Debug.log_level("info"), "trace");
        }
    }

    #[test]
    fn test_config_builder() {
        let config = CliConfig::new().with_verbosity(Verbosity::Verbose);
        assert_eq!(config.verbosity, Verbosity::Verbose);
        assert!(!config.color);
    }
}
