//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Smartprobe: browser e2e testing with multi-strategy fallback locators
#[derive(Parser, Debug)]
#[command(name = "smartprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (YAML); defaults plus SMARTPROBE_* variables otherwise
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective settings
    Config(ConfigArgs),

    /// Resolve one ad-hoc locator on a live page and print the attempt trace
    Probe(ProbeArgs),

    /// Run the shopping flow for a scenario
    Run(RunArgs),

    /// List supported strategy kinds
    Strategies,
}

/// Settings output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML
    #[default]
    Yaml,
    /// JSON
    Json,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = ConfigFormat::Yaml)]
    pub format: ConfigFormat,
}

/// Arguments for the probe command.
///
/// Strategies are tried kind by kind in the order xpath, css, text, role,
/// test-id; repeated flags of one kind keep their order.
#[derive(Args, Debug, Default)]
pub struct ProbeArgs {
    /// Page to open
    #[arg(long)]
    pub url: String,

    /// Locator name used in logs and the trace
    #[arg(long, default_value = "Probe")]
    pub name: String,

    /// XPath strategy
    #[arg(long)]
    pub xpath: Vec<String>,

    /// CSS selector strategy
    #[arg(long)]
    pub css: Vec<String>,

    /// Visible text strategy
    #[arg(long)]
    pub text: Vec<String>,

    /// Role strategy, `role` or `role[name=X]`
    #[arg(long)]
    pub role: Vec<String>,

    /// data-testid strategy
    #[arg(long)]
    pub test_id: Vec<String>,

    /// Require visibility rather than attachment
    #[arg(long)]
    pub visible: bool,

    /// Per-strategy timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the run command
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Scenario number in the data file, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pub scenario: usize,

    /// Scenario file; `<data_dir>/test_data.yaml` by default
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_probe_collects_repeated_flags() {
        let cli = Cli::parse_from([
            "smartprobe",
            "probe",
            "--url",
            "https://www.ebay.com",
            "--xpath",
            "//a[@id='gh-la']",
            "--xpath",
            "//a[contains(@class, 'gh-logo')]",
            "--css",
            "a#gh-la",
            "--visible",
        ]);
        let Commands::Probe(args) = cli.command else {
            panic!("expected probe");
        };
        assert_eq!(args.xpath.len(), 2);
        assert_eq!(args.css, vec!["a#gh-la".to_string()]);
        assert!(args.visible);
        assert_eq!(args.name, "Probe");
        assert_eq!(args.timeout, None);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["smartprobe", "config", "-vv", "--format", "json"]);
        assert_eq!(cli.verbose, 2);
        let Commands::Config(args) = cli.command else {
            panic!("expected config");
        };
        assert_eq!(args.format, ConfigFormat::Json);
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["smartprobe", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.scenario, 1);
        assert!(args.data.is_none());
        assert!(!args.json);
    }

    #[test]
    fn test_probe_requires_url() {
        assert!(Cli::try_parse_from(["smartprobe", "probe", "--css", "a"]).is_err());
    }
}
