//! Tracing subscriber setup for the binary.
//!
//! Library code only emits events; installing a subscriber is the caller's
//! choice.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive (e.g. `debug`,
/// `brane_evidence::sampler=debug`).
pub const LOG_ENV: &str = "BRANE_LOG";

/// Install a stderr fmt subscriber. `verbose` lowers the default level to
/// `debug`; an explicit `BRANE_LOG` always wins. Calling twice is a no-op.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
