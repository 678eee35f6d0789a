//! diagnostic logging
//!
//! logs go to stderr so stdout stays reserved for command output. the filter
//! comes from `SHOW_WHEN_LOG` when set, otherwise from the `-v` count.

use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const LOG_ENV_VAR: &str = "SHOW_WHEN_LOG";

/// level for a `-v` count: warn, info, debug, trace
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn build_env_filter(verbosity: u8, quiet: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV_VAR) {
        return filter;
    }
    if quiet {
        return EnvFilter::new("off");
    }
    EnvFilter::new(format!("show_when={}", level_for(verbosity)))
}

/// install the global subscriber; a second call is a no-op
pub fn init(verbosity: u8, quiet: bool) {
    let filter = build_env_filter(verbosity, quiet);

    // try_init fails only when a subscriber is already installed
    let _ = Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
