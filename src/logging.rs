//! Diagnostic output for the command line tool.
//!
//! Library code only emits `tracing` events; installing a subscriber is up
//! to the application.

use tracing_subscriber::EnvFilter;

/// Build the event filter: `RUST_LOG` if set, otherwise `default_directive`.
///
/// An unparsable directive falls back to `info`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a stderr `fmt` subscriber.
///
/// `quiet` turns everything off, ignoring `RUST_LOG`. Calling this twice is
/// harmless; the first subscriber stays installed.
pub fn init(default_directive: &str, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        env_filter(default_directive)
    };

    let ansi = std::env::var_os("NO_COLOR").is_none();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
