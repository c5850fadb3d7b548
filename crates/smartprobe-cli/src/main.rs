//! Smartprobe CLI
//!
//! ## Usage
//!
//! ```bash
//! smartprobe config --format json
//! smartprobe probe --url https://www.ebay.com --name "Search Input" \
//!     --xpath "//input[@id='gh-ac']" --css "input[name='_nkw']" --visible
//! smartprobe run --scenario 2
//! smartprobe strategies
//! ```

use clap::Parser;
use smartprobe::{SessionFactory, Settings};
use smartprobe_cli::{
    render_report, render_strategies, render_trace, runner, Cli, CliConfig, CliError, CliResult,
    Commands, ConfigArgs, ConfigFormat, ProbeArgs, Reporter, RunArgs, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_auto_color();

    match cli.command {
        Commands::Strategies => {
            print!("{}", render_strategies());
            Ok(())
        }
        Commands::Config(args) => {
            let settings = runner::load_settings(cli.config.as_deref())?;
            run_config(&settings, &args)
        }
        Commands::Probe(args) => {
            let settings = runner::load_settings(cli.config.as_deref())?;
            init_logging(&config, &settings)?;
            run_probe(&config, settings, &args)
        }
        Commands::Run(args) => {
            let settings = runner::load_settings(cli.config.as_deref())?;
            init_logging(&config, &settings)?;
            run_flow(&config, settings, &args)
        }
    }
}

fn init_logging(config: &CliConfig, settings: &Settings) -> CliResult<()> {
    smartprobe::logging::init_console(config.verbosity.log_level(&settings.logging.level))?;
    Ok(())
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))
}

fn run_config(settings: &Settings, args: &ConfigArgs) -> CliResult<()> {
    let rendered = match args.format {
        ConfigFormat::Yaml => serde_yaml_ng::to_string(settings)?,
        ConfigFormat::Json => serde_json::to_string_pretty(settings)? + "\n",
    };
    print!("{rendered}");
    Ok(())
}

fn run_probe(config: &CliConfig, settings: Settings, args: &ProbeArgs) -> CliResult<()> {
    runner::probe_locator(args, settings.locator.locator_timeout_ms)?;
    let factory = SessionFactory::new(runner::live_launcher("probe")?, settings);
    let result = runtime()?.block_on(runner::probe(&factory, args))?;

    println!("{}", render_trace(&result)?);
    let reporter = Reporter::new(config.color, config.verbosity.is_quiet());
    match &result.winning_strategy {
        Some(strategy) if result.succeeded => {
            reporter.success(&format!(
                "'{}' resolved on attempt {} using {strategy}",
                result.locator_name, result.attempt_count
            ));
            Ok(())
        }
        _ => Err(CliError::Unresolved {
            name: result.locator_name.clone(),
            attempts: result.attempt_count,
        }),
    }
}

fn run_flow(config: &CliConfig, settings: Settings, args: &RunArgs) -> CliResult<()> {
    let scenario = runner::scenario(&settings, args)?;
    let factory = SessionFactory::new(runner::live_launcher("run")?, settings);
    let reporter = Reporter::new(config.color, config.verbosity.is_quiet());
    reporter.info(&format!(
        "Running '{}' (max ${}, limit {})",
        scenario.search_query, scenario.max_price, scenario.limit
    ));
    let report = runtime()?.block_on(runner::run_flow(&factory, scenario))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report, config.color));
    }
    match report.failed_step() {
        None => {
            reporter.success("Shopping flow passed");
            Ok(())
        }
        Some(step) => Err(CliError::FlowFailed {
            step: step.step.to_string(),
            detail: step.detail.clone(),
        }),
    }
}
