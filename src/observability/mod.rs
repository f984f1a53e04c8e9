//! Logging setup for the binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the caller. `RUST_LOG` wins when set, otherwise `-v` repetitions pick
//! the level.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level for a count of `-v` flags: warn, info, debug, then trace.
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn filter_for(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "codebench={}",
            level_for_verbosity(verbosity).as_str().to_ascii_lowercase()
        ))
    })
}

/// Install a stderr `fmt` subscriber. A second call is a no-op.
pub fn init_tracing(verbosity: u8) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter_for(verbosity))
        .try_init();
}
