//! Session lifecycle glue invoked by login/logout flows.
//!
//! Push registration is best-effort relative to authentication: within a
//! single `on_login` call acquisition strictly precedes registration, and
//! failures in either step are logged and reported in the returned summary
//! but never block the login or logout itself.

use crate::acquirer::TokenAcquirer;
use crate::models::DeviceToken;
use crate::registry::TokenRegistry;
use std::sync::Arc;
use tracing::{info, warn};

/// Summary of what the login sequence achieved for push notifications.
#[derive(Debug, Clone)]
pub struct LoginReport {
    /// The token that was acquired, if any.
    pub token: Option<DeviceToken>,
    /// Whether the backend confirmed the registration.
    pub registered: bool,
}

/// Sequences the acquirer and registry around login/logout.
pub struct SessionLifecycle {
    acquirer: Arc<TokenAcquirer>,
    registry: Arc<TokenRegistry>,
}

impl SessionLifecycle {
    pub fn new(acquirer: Arc<TokenAcquirer>, registry: Arc<TokenRegistry>) -> Self {
        Self { acquirer, registry }
    }

    /// Acquire a token and register it under the freshly authenticated
    /// session. Never fails; inspect the report for the outcome.
    pub async fn on_login(&self) -> LoginReport {
        let Some(token) = self.acquirer.get_token().await else {
            info!(
                component = "session",
                "no device token available, skipping push registration"
            );
            return LoginReport {
                token: None,
                registered: false,
            };
        };

        match self.registry.register_token(&token).await {
            Ok(outcome) => {
                info!(
                    component = "session",
                    message = outcome.message.as_deref().unwrap_or(""),
                    "push registration completed"
                );
                LoginReport {
                    token: Some(token),
                    registered: outcome.success,
                }
            }
            Err(e) => {
                warn!(
                    component = "session",
                    error = %e,
                    "push registration failed, continuing login"
                );
                LoginReport {
                    token: Some(token),
                    registered: false,
                }
            }
        }
    }

    /// Deactivate this session's token with the backend. Never fails;
    /// deactivation errors are logged and logout proceeds.
    pub async fn on_logout(&self) {
        if let Err(e) = self.registry.deactivate_token().await {
            warn!(
                component = "session",
                error = %e,
                "push deactivation failed, continuing logout"
            );
        }
    }
}
