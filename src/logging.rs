//! Tracing setup
//!
//! `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.

use tracing_subscriber::EnvFilter;

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install the global fmt subscriber. Fails if one is already installed.
pub fn init(verbose: bool) -> Result<(), InitError> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .compact()
        .try_init()
}
