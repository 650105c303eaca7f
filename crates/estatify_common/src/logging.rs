//! Logging utilities for the Estatify application.
//!
//! All components log structured, leveled tracing events keyed by component
//! name and operation, so test harnesses and operators can filter on fields
//! instead of scraping message strings. This module owns subscriber setup.

use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber with the default log level (INFO).
///
/// This should be called once at the start of the application. Repeated calls
/// are harmless: if a global subscriber is already installed, the call is a
/// no-op.
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific minimum log level.
///
/// The `RUST_LOG` environment variable still takes precedence for targets it
/// names, so individual components can be turned up without code changes.
pub fn init_with_level(level: Level) {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("estatify={}", level).parse().expect("static directive"));

    // Use try_init to handle the case where a global default subscriber has
    // already been set (tests, embedding hosts).
    let result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!(%level, "logging initialized");
    }
}
