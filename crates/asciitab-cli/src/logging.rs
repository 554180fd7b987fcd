//! Diagnostic logging
//!
//! Logs go to stderr so they never mix with the interactive prompts on
//! stdout. `RUST_LOG` takes precedence over the `-v` flags, e.g.
//! `RUST_LOG=asciitab_core=debug` shows every parsed line.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
