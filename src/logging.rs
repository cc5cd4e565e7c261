//! Tracing setup: a full log file under the state directory plus a quiet
//! stderr layer that stays out of the progress UI's way.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

pub const LOG_FILE: &str = "gamesmith.log";

/// Install the global subscriber. Keep the returned guard alive until exit
/// or buffered file output is lost.
///
/// `RUST_LOG` overrides the default filter.
pub fn init(log_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("gamesmith=debug,warn")
            } else {
                EnvFilter::try_new("gamesmith=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));

    let stderr_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .with_filter(stderr_level),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
