//! Logging setup for the binary.

use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr, filtered by `RUST_LOG`. Defaults to `info`.
pub fn init(json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if json {
        let format = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(false);

        tracing_subscriber::registry()
            .with(format)
            .with(filter)
            .init();
    } else {
        let format = fmt::layer()
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr)
            .with_file(false);

        tracing_subscriber::registry()
            .with(format)
            .with(filter)
            .init();
    }
}
