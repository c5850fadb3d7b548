//! Smartprobe CLI library
//!
//! Command definitions and handlers behind the `smartprobe` binary.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod output;
pub mod runner;

pub use commands::{Cli, Commands, ConfigArgs, ConfigFormat, ProbeArgs, RunArgs};
pub use config::{CliConfig, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_report, render_strategies, render_trace, Reporter};
