//! Tracing subscriber setup.
//!
//! Console output always; a non-blocking file writer when
//! `logging.file_output` is set. `RUST_LOG` wins over the configured level.

use crate::config::{LogSettings, PathSettings};
use crate::result::{ProbeError, ProbeResult};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Keeps the file writer flushing. Drop it only at shutdown.
#[derive(Debug)]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Build the filter: `RUST_LOG` if set and valid, else `level`
pub fn env_filter(level: &str) -> ProbeResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| ProbeError::config(format!("invalid log level '{level}': {e}"))),
    }
}

/// Install the global subscriber.
///
/// A second call leaves the first subscriber in place and still returns a
/// guard, so tests and binaries can both call it.
pub fn init(logging: &LogSettings, paths: &PathSettings) -> ProbeResult<LogGuard> {
    let filter = env_filter(&logging.level)?;

    let (file_writer, guard) = if logging.file_output {
        std::fs::create_dir_all(&paths.logs_dir)?;
        let appender = tracing_appender::rolling::never(&paths.logs_dir, &paths.log_file);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };

    let json = logging.json;
    let console_text = (!json).then(|| fmt::layer().with_target(true));
    let console_json = json.then(|| fmt::layer().json().with_current_span(false));
    let file_layer = file_writer.map(|writer| fmt::layer().with_writer(writer).with_ansi(false));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(console_text)
        .with(console_json)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            level = %logging.level,
            json,
            file = logging.file_output,
            "logging initialised"
        );
    }
    Ok(LogGuard { _file: guard })
}

/// Console-only subscriber at `level`, for command-line tools
pub fn init_console(level: &str) -> ProbeResult<()> {
    let filter = env_filter(level)?;
    // Already-installed subscriber is fine.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
    Ok(())
}
