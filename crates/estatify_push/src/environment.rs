//! Runtime capability detection.
//!
//! The environment is classified once at startup from the ownership signal
//! exposed by the host runtime and is immutable for the process lifetime.
//! Every other component receives the classification (or a provider chosen
//! from it) by injection instead of probing native modules at call sites.

use estatify_config::RuntimeConfig;
use once_cell::sync::OnceCell;
use tracing::info;

/// Runtime environment classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Restricted managed runtime; native messaging APIs are unavailable.
    Sandboxed,
    /// Full native capability.
    Native,
}

impl Environment {
    pub fn is_native(self) -> bool {
        self == Environment::Native
    }
}

/// Classify the runtime from the host's ownership signal.
///
/// Pure so it can be tested directly. Only an explicit `"standalone"` signal
/// yields `Native`; anything else, including a missing signal, falls back to
/// the conservative capability-denying `Sandboxed`.
pub fn classify(app_ownership: Option<&str>) -> Environment {
    match app_ownership {
        Some("standalone") => Environment::Native,
        _ => Environment::Sandboxed,
    }
}

static DETECTED: OnceCell<Environment> = OnceCell::new();

/// Detect the runtime environment, memoized for the process lifetime.
///
/// The first call computes and logs the classification; later calls return
/// the cached value regardless of configuration changes.
pub fn detect(runtime: &RuntimeConfig) -> Environment {
    *DETECTED.get_or_init(|| {
        let environment = classify(runtime.app_ownership.as_deref());
        info!(?environment, ownership = ?runtime.app_ownership, "runtime environment detected");
        environment
    })
}
