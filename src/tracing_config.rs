use std::{env, path::Path};

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigPaths, LogLevel};

const FORMAT_VAR: &str = "MPRIS_PILOT_LOG_FORMAT";
const DAYS_TO_KEEP: usize = 7;

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()))
}

fn json_requested() -> bool {
    env::var(FORMAT_VAR).is_ok_and(|format| format == "json")
}

/// Initialize console logging.
///
/// `RUST_LOG` wins over `level`. `MPRIS_PILOT_LOG_FORMAT=json` switches to
/// JSON lines.
///
/// # Errors
/// Returns error if a global subscriber is already installed.
pub fn init(level: LogLevel) -> Result<(), Box<dyn std::error::Error>> {
    let registry = tracing_subscriber::registry().with(env_filter(level));

    if json_requested() {
        registry
            .with(fmt::layer().json().with_target(true).with_level(true))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().compact().with_target(true).with_level(true))
            .try_init()?;
    }

    Ok(())
}

/// Initialize console logging plus a daily-rolling log file.
///
/// Files go to `dir` when given, otherwise to `$HOME/.mpris-pilot/logs`.
/// The returned guard flushes the file writer when dropped and must be kept
/// alive for the lifetime of the program.
///
/// # Errors
/// Returns error if the log directory or file cannot be created, or if a
/// global subscriber is already installed.
pub fn init_with_file(
    level: LogLevel,
    dir: Option<&Path>,
) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let log_dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => ConfigPaths::log_dir()?,
    };

    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .max_log_files(DAYS_TO_KEEP)
        .filename_prefix("mpris-pilot")
        .filename_suffix("log")
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let registry = tracing_subscriber::registry().with(env_filter(level));

    if json_requested() {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(guard)
}
