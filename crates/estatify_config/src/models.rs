//! Typed configuration models for the Estatify services.
//!
//! Every section has serde defaults so a completely empty configuration file
//! (or none at all) still yields a usable `AppConfig`; environment overrides
//! and the optional `config/estatify.toml` file only need to name what they
//! change.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host runtime classification and device identity.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Backend REST endpoint configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Push notification subsystem configuration.
    #[serde(default)]
    pub push: PushConfig,
}

/// Host runtime classification and device identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Ownership/build classification exposed by the host runtime.
    ///
    /// `"standalone"` marks a full native build; `"managed"` marks a
    /// restricted managed runtime. When the host exposes no signal this is
    /// absent and the environment is classified as sandboxed.
    pub app_ownership: Option<String>,

    /// Device type reported to the backend on registration ("android"/"ios").
    #[serde(default = "default_device_type")]
    pub device_type: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            app_ownership: None,
            device_type: default_device_type(),
        }
    }
}

/// Backend REST endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the CRM backend API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Push notification subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Prefix used when synthesizing a fallback token.
    #[serde(default = "default_fallback_prefix")]
    pub fallback_prefix: String,

    /// Whether synthetic fallback tokens may be sent to the backend.
    ///
    /// When false, the token registry refuses fallback-origin tokens instead
    /// of registering them.
    #[serde(default = "default_register_fallback_tokens")]
    pub register_fallback_tokens: bool,

    /// Path of the JSON file backing durable storage. When absent an
    /// in-memory store is used and nothing survives a restart.
    pub storage_path: Option<String>,

    /// Default delivery channel applied to all locally scheduled
    /// notifications.
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            fallback_prefix: default_fallback_prefix(),
            register_fallback_tokens: default_register_fallback_tokens(),
            storage_path: None,
            channel: ChannelConfig::default(),
        }
    }
}

/// Platform-level notification channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel identifier.
    #[serde(default = "default_channel_id")]
    pub id: String,

    /// Human-readable channel name.
    #[serde(default = "default_channel_name")]
    pub name: String,

    /// Channel importance ("high" by default).
    #[serde(default = "default_channel_importance")]
    pub importance: String,

    /// Whether the default sound plays on delivery.
    #[serde(default = "default_channel_sound")]
    pub sound: bool,

    /// Vibration pattern in milliseconds.
    #[serde(default = "default_vibration_pattern")]
    pub vibration_pattern: Vec<u64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            id: default_channel_id(),
            name: default_channel_name(),
            importance: default_channel_importance(),
            sound: default_channel_sound(),
            vibration_pattern: default_vibration_pattern(),
        }
    }
}

fn default_device_type() -> String {
    "android".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_fallback_prefix() -> String {
    "estatify-fallback".to_string()
}

fn default_register_fallback_tokens() -> bool {
    true
}

fn default_channel_id() -> String {
    "estatify-default".to_string()
}

fn default_channel_name() -> String {
    "Estatify notifications".to_string()
}

fn default_channel_importance() -> String {
    "high".to_string()
}

fn default_channel_sound() -> bool {
    true
}

fn default_vibration_pattern() -> Vec<u64> {
    vec![0, 250, 250, 250]
}
