//! Tracing subscriber setup for the binary
//!
//! Logs go to stderr so command output on stdout stays pipeable.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_ENV: &str = "FRESHLINE_LOG";

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Default directive for a `-v` count
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber once
///
/// `FRESHLINE_LOG` wins over `RUST_LOG`; both win over the verbosity flag.
pub fn init(verbosity: u8) {
    if INSTALLED.get().is_some() {
        return;
    }

    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .is_ok()
    {
        let _ = INSTALLED.set(());
    }
}
