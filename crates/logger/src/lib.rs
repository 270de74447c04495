//! Process diagnostics for the Uppe binaries.
//!
//! Diagnostics are written to stderr so that stdout stays free for command
//! output such as `--print-config`.

use std::{env::var, io};

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the environment variable selecting the output format (`json` or compact).
pub const FORMAT_VAR: &str = "RUST_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Compact,
    Json,
}

impl Format {
    fn from_env() -> Self {
        let raw = var(FORMAT_VAR).unwrap_or_default();
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Format::Json,
            _ => Format::Compact,
        }
    }
}

/// Install the global subscriber with `INFO` as the default level
pub fn init() {
    init_with_level(LevelFilter::INFO);
}

/// Install the global subscriber. `RUST_LOG` directives take precedence over `level`.
///
/// Calling this twice is harmless: the second installation is rejected and a
/// warning is emitted through the first one.
pub fn init_with_level(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_layer = match Format::from_env() {
        Format::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_filter(env_filter)
            .boxed(),
        Format::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_target(false)
            .with_writer(io::stderr)
            .with_filter(env_filter)
            .boxed(),
    };

    if let Err(error) = tracing_subscriber::registry().with(log_layer).try_init() {
        warn!("Diagnostics subscriber already installed: {error}");
    }
}
