//! Session-scoped token registry.
//!
//! Owns the relationship between the device token and the backend: persists
//! the token locally, registers it under the authenticated session, and
//! deactivates it on logout. The in-memory cache is the fast path for
//! lookups; durable storage covers cold starts.
//!
//! Overlapping `register_token` calls are not serialized; the last network
//! response to complete wins as the persisted value. The cache mutex only
//! protects the in-memory copy, never a network call.

use crate::client::BackendClient;
use crate::error::PushError;
use crate::models::{DeviceToken, RegistrationOutcome};
use estatify_common::KeyValueStore;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Durable storage key holding the current device token.
pub const PUSH_TOKEN_KEY: &str = "pushToken";

/// Durable storage key holding the session auth token. Written by the
/// authentication layer; read-only here.
pub const SESSION_TOKEN_KEY: &str = "token";

/// Registry for the current device token.
pub struct TokenRegistry {
    client: BackendClient,
    store: Arc<dyn KeyValueStore>,
    device_type: String,
    register_fallback_tokens: bool,
    cached: Mutex<Option<DeviceToken>>,
}

impl TokenRegistry {
    pub fn new(
        client: BackendClient,
        store: Arc<dyn KeyValueStore>,
        device_type: impl Into<String>,
        register_fallback_tokens: bool,
    ) -> Self {
        Self {
            client,
            store,
            device_type: device_type.into(),
            register_fallback_tokens,
            cached: Mutex::new(None),
        }
    }

    fn cached_lock(&self) -> MutexGuard<'_, Option<DeviceToken>> {
        self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn session_token(&self) -> Result<String, PushError> {
        self.store
            .get(SESSION_TOKEN_KEY)
            .await?
            .ok_or(PushError::AuthMissing)
    }

    /// The current device token, if any.
    ///
    /// In-memory fast path; falls back to durable storage after a cold
    /// start. Only the raw value survives a restart, so restored tokens
    /// carry gateway provenance.
    pub async fn current_token(&self) -> Option<DeviceToken> {
        if let Some(token) = self.cached_lock().clone() {
            return Some(token);
        }
        match self.store.get(PUSH_TOKEN_KEY).await {
            Ok(Some(value)) => {
                let token = DeviceToken::restored(value);
                *self.cached_lock() = Some(token.clone());
                debug!(component = "token_registry", "token restored from durable storage");
                Some(token)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(component = "token_registry", error = %e, "durable token lookup failed");
                None
            }
        }
    }

    /// Whether a token is currently registered for this installation.
    pub async fn is_token_registered(&self) -> bool {
        self.current_token().await.is_some()
    }

    /// Register `token` with the backend under the active session.
    ///
    /// Fails fast with [`PushError::AuthMissing`] when no session token is
    /// stored; no network call is attempted in that case. On backend
    /// success the token is written to durable storage and becomes the
    /// single current token, superseding any cached value.
    pub async fn register_token(
        &self,
        token: &DeviceToken,
    ) -> Result<RegistrationOutcome, PushError> {
        if token.is_fallback() && !self.register_fallback_tokens {
            warn!(
                component = "token_registry",
                "refusing to register synthetic fallback token (policy)"
            );
            return Err(PushError::CapabilityUnavailable);
        }

        let session_token = self.session_token().await?;

        if token.is_fallback() {
            warn!(
                component = "token_registry",
                "registering synthetic fallback token with the backend"
            );
        }

        let response = self
            .client
            .register_push_token(&session_token, &token.value, &self.device_type)
            .await?;

        self.store.put(PUSH_TOKEN_KEY, &token.value).await?;
        *self.cached_lock() = Some(token.clone());
        info!(
            component = "token_registry",
            origin = ?token.origin,
            "push token registered"
        );

        Ok(RegistrationOutcome {
            success: true,
            message: response.message,
        })
    }

    /// Deactivate the registration with the backend.
    ///
    /// The local copies (memory and durable storage) are cleared only after
    /// the backend confirms deactivation; on failure the token is kept so it
    /// is not silently lost while the backend still has it.
    pub async fn deactivate_token(&self) -> Result<(), PushError> {
        let session_token = self.session_token().await?;
        self.client.deactivate_push_token(&session_token).await?;

        self.store.remove(PUSH_TOKEN_KEY).await?;
        *self.cached_lock() = None;
        info!(component = "token_registry", "push token deactivated");
        Ok(())
    }

    /// Re-send the currently cached token to the backend.
    ///
    /// Useful after a process restart. Fails with
    /// [`PushError::NoTokenAvailable`] when nothing is cached.
    pub async fn refresh_registration(&self) -> Result<RegistrationOutcome, PushError> {
        let token = self
            .current_token()
            .await
            .ok_or(PushError::NoTokenAvailable)?;
        self.register_token(&token).await
    }
}
