//! # Structured Logging
//!
//! Initializes the `tracing` subscriber for one `locktoken` invocation.
//! Output goes to stderr so stdout carries only the JSON result.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the `-v`
//! count: each step lowers the level of the ledger crates.

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events the default filter controls.
const LEDGER_CRATES: [&str; 3] = ["locktoken", "locktoken_contracts", "locktoken_protocol"];

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-line, colored output.
    Pretty,
    /// One line per event.
    Compact,
    /// Machine-parseable JSON lines.
    Json,
}

/// Filter directives for `verbosity` repetitions of `-v`.
///
/// Committed and rejected actions log at info/warn, debits and credits at
/// debug, storage at trace.
pub fn default_filter(verbosity: u8) -> String {
    let levels: [&str; 3] = match verbosity {
        0 => ["info", "info", "warn"],
        1 => ["debug", "debug", "info"],
        _ => ["trace", "trace", "trace"],
    };
    LEDGER_CRATES
        .iter()
        .zip(levels)
        .map(|(krate, level)| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(default_filter: &str, format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr).with_file(false))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
            .try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install log subscriber: {e}"))?;

    tracing::debug!(?format, filter = default_filter, "logging initialized");
    Ok(())
}
