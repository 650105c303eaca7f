//! Device token acquisition.
//!
//! Produces *some* identifier for every native-capable flow: a cached token
//! when one exists, a gateway token when the native call succeeds, or a
//! locally synthesized fallback when it does not. Acquisition failures never
//! escape this boundary; they are absorbed into the fallback path and logged
//! as structured events. Returning `None` is reserved for the two cases
//! where no registration would be meaningful at all: a sandboxed runtime and
//! a denied permission prompt.

use crate::environment::Environment;
use crate::models::DeviceToken;
use crate::provider::{CapabilityProvider, PermissionStatus};
use crate::registry::TokenRegistry;
use chrono::Utc;
use estatify_common::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Durable storage key holding the stable per-install identity.
pub const INSTALLATION_ID_KEY: &str = "installationId";

/// Acquires the delivery token for this device + app installation.
pub struct TokenAcquirer {
    environment: Environment,
    provider: Arc<dyn CapabilityProvider>,
    registry: Arc<TokenRegistry>,
    store: Arc<dyn KeyValueStore>,
    fallback_prefix: String,
}

impl TokenAcquirer {
    pub fn new(
        environment: Environment,
        provider: Arc<dyn CapabilityProvider>,
        registry: Arc<TokenRegistry>,
        store: Arc<dyn KeyValueStore>,
        fallback_prefix: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            provider,
            registry,
            store,
            fallback_prefix: fallback_prefix.into(),
        }
    }

    /// Obtain a delivery token.
    ///
    /// Idempotent: an already-cached token is returned unchanged. In a
    /// sandboxed runtime or after a denied permission prompt this returns
    /// `None`; otherwise the caller always receives a token, synthesized
    /// locally if the gateway call fails or returns empty.
    pub async fn get_token(&self) -> Option<DeviceToken> {
        if let Some(existing) = self.registry.current_token().await {
            debug!(component = "token_acquirer", "returning cached token");
            return Some(existing);
        }

        if !self.environment.is_native() {
            debug!(
                component = "token_acquirer",
                "sandboxed runtime, token acquisition refused"
            );
            return None;
        }

        match self.provider.request_permission().await {
            Ok(PermissionStatus::Granted) => {}
            Ok(PermissionStatus::Denied) => {
                info!(component = "token_acquirer", "notification permission denied");
                return None;
            }
            Err(e) => {
                // A throwing permission prompt is treated like a denial.
                warn!(component = "token_acquirer", error = %e, "permission request failed");
                return None;
            }
        }

        let installation_id = self.installation_id().await;
        match self.provider.device_token(&installation_id).await {
            Ok(value) if !value.is_empty() => {
                info!(component = "token_acquirer", "gateway token acquired");
                Some(DeviceToken::native(value))
            }
            Ok(_) => {
                warn!(
                    component = "token_acquirer",
                    "gateway returned an empty token, synthesizing fallback"
                );
                Some(self.synthesize_fallback())
            }
            Err(e) => {
                warn!(
                    component = "token_acquirer",
                    error = %e,
                    "gateway token fetch failed, synthesizing fallback"
                );
                Some(self.synthesize_fallback())
            }
        }
    }

    /// The stable per-install identity, minted and persisted on first use.
    async fn installation_id(&self) -> String {
        match self.store.get(INSTALLATION_ID_KEY).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                let id = Uuid::new_v4().to_string();
                if let Err(e) = self.store.put(INSTALLATION_ID_KEY, &id).await {
                    warn!(component = "token_acquirer", error = %e, "could not persist installation id");
                }
                id
            }
            Err(e) => {
                warn!(component = "token_acquirer", error = %e, "installation id lookup failed");
                Uuid::new_v4().to_string()
            }
        }
    }

    fn synthesize_fallback(&self) -> DeviceToken {
        let mut suffix = Uuid::new_v4().simple().to_string();
        suffix.truncate(8);
        let value = format!(
            "{}-{}-{}",
            self.fallback_prefix,
            Utc::now().timestamp_millis(),
            suffix
        );
        DeviceToken::fallback(value)
    }
}
