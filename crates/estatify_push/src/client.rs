//! REST client for the backend push-notification endpoints.
//!
//! The registry talks to exactly two endpoints, both authenticated with the
//! session bearer token:
//!
//! - `POST /push-notifications/register` with `{pushToken, deviceType}`
//! - `POST /push-notifications/logout`
//!
//! A 2xx response means success; any other status is surfaced as
//! [`PushError::BackendError`] with the HTTP status echoed.

use crate::error::PushError;
use estatify_config::BackendConfig;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

/// Request body for the register endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPushRequest<'a> {
    push_token: &'a str,
    device_type: &'a str,
}

/// Response body of the register endpoint.
///
/// The backend may include a human-readable message; bodies that fail to
/// parse are treated as empty rather than as errors.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterPushResponse {
    pub message: Option<String>,
}

/// Client for the backend push-notification REST surface.
///
/// No timeout is applied beyond reqwest's defaults; a stalled call suspends
/// its future indefinitely and callers apply their own timeout if they need
/// one.
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Register a push token under the authenticated session.
    pub async fn register_push_token(
        &self,
        session_token: &str,
        push_token: &str,
        device_type: &str,
    ) -> Result<RegisterPushResponse, PushError> {
        let url = format!("{}/push-notifications/register", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", session_token))
            .json(&RegisterPushRequest {
                push_token,
                device_type,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PushError::BackendError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await.unwrap_or_default())
    }

    /// Deregister this session's push token.
    pub async fn deactivate_push_token(&self, session_token: &str) -> Result<(), PushError> {
        let url = format!("{}/push-notifications/logout", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", session_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PushError::BackendError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
