// src/logging.rs

//! Logging for the `pulserun` binary.
//!
//! The filter comes from, in order:
//! 1. `--log-level` (applies to every target)
//! 2. `PULSERUN_LOG`, read as `tracing-subscriber` directives, so both
//!    `debug` and `warn,pulserun::tail=trace` work
//! 3. `info`
//!
//! Output goes to stderr; stdout is reserved for command results.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "PULSERUN_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

/// Resolve the effective filter. Unparseable `env` directives are reported
/// on stderr and replaced by the default.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.as_str());
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            // The subscriber is not installed yet, so this cannot go through tracing.
            eprintln!("ignoring invalid {LOG_ENV_VAR}={directives:?}: {e}");
            EnvFilter::new(DEFAULT_DIRECTIVES)
        }),
        None => EnvFilter::new(DEFAULT_DIRECTIVES),
    }
}
