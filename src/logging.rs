//! Logging setup for the `adapterhub` binary.
//!
//! Logs go to stderr so stdout carries nothing but JSON envelopes.
//! `RUST_LOG` takes precedence over the verbosity flags when set.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{AdapterError, Result};

/// Map CLI flags to a level (0=INFO, 1=DEBUG, 2+=TRACE, quiet=ERROR)
#[must_use]
pub const fn level_for(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Initializes structured logging based on verbosity level.
///
/// Can only succeed once per process.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = level_for(verbose, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("adapterhub={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .try_init()
        .map_err(|e| AdapterError::config(format!("Failed to initialize logging: {e}")))
}
