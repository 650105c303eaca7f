//! Configuration loading for the Estatify services.
//!
//! Configuration is layered: built-in serde defaults, then an optional
//! `config/estatify.toml` file, then `ESTATIFY`-prefixed environment
//! variables with `__` as the path separator (for example
//! `ESTATIFY__RUNTIME__APP_OWNERSHIP=standalone` overrides
//! `runtime.app_ownership`). A `.env` file is loaded once per process before
//! the environment source is read.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use tracing::debug;

pub mod models;

pub use models::{AppConfig, BackendConfig, ChannelConfig, PushConfig, RuntimeConfig};

/// The prefix for configuration environment variables
pub const ENV_PREFIX: &str = "ESTATIFY";

/// The separator for configuration environment variables
pub const ENV_SEPARATOR: &str = "__";

static DOTENV: OnceCell<()> = OnceCell::new();

/// Load `.env` into the process environment, once per process.
///
/// Later calls are no-ops; a missing `.env` file is not an error.
pub fn ensure_dotenv_loaded() {
    DOTENV.get_or_init(|| {
        if dotenv::dotenv().is_ok() {
            debug!("loaded environment overrides from .env");
        }
    });
}

/// Load the application configuration.
///
/// Dependent crates call this instead of assembling sources themselves, so
/// they do not need to know where configuration comes from.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();
    Config::builder()
        .add_source(File::with_name("config/estatify").required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_deserializes_with_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.runtime.app_ownership, None);
        assert_eq!(config.runtime.device_type, "android");
        assert_eq!(config.backend.base_url, "http://localhost:8080/api");
        assert!(config.push.register_fallback_tokens);
        assert_eq!(config.push.channel.importance, "high");
        assert_eq!(config.push.channel.vibration_pattern, vec![0, 250, 250, 250]);
    }

    #[test]
    fn partial_config_keeps_defaults_for_the_rest() {
        let config: AppConfig = serde_json::from_str(
            r#"{"runtime": {"app_ownership": "standalone"}, "push": {"fallback_prefix": "crm"}}"#,
        )
        .unwrap();
        assert_eq!(config.runtime.app_ownership.as_deref(), Some("standalone"));
        assert_eq!(config.runtime.device_type, "android");
        assert_eq!(config.push.fallback_prefix, "crm");
        assert!(config.push.channel.sound);
    }
}
