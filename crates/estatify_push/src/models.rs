//! Data model for the push subsystem.
//!
//! These types are owned by the subsystem: `DeviceToken` by the token
//! registry, `ScheduledNotification` by the capability provider, and
//! `IncomingNotification` / `DomainAction` by the listener dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Where a device token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenOrigin {
    /// Issued by the native messaging gateway.
    NativeGateway,
    /// Synthesized locally because the native call failed or returned empty.
    SyntheticFallback,
}

/// A delivery token identifying this device + app installation.
///
/// At most one token is current per installation at any time; registering a
/// new token supersedes, never appends to, the cached value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceToken {
    /// Opaque token value, as handed to the backend.
    pub value: String,
    /// Provenance of the token.
    pub origin: TokenOrigin,
    /// When the token was obtained.
    pub captured_at: DateTime<Utc>,
}

impl DeviceToken {
    /// A token issued by the native gateway.
    pub fn native(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            origin: TokenOrigin::NativeGateway,
            captured_at: Utc::now(),
        }
    }

    /// A locally synthesized fallback token.
    pub fn fallback(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            origin: TokenOrigin::SyntheticFallback,
            captured_at: Utc::now(),
        }
    }

    /// A token reloaded from durable storage after a cold start.
    ///
    /// Only the raw value is persisted, so provenance is not retained;
    /// restored tokens are treated as gateway-issued.
    pub fn restored(value: impl Into<String>) -> Self {
        Self::native(value)
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == TokenOrigin::SyntheticFallback
    }
}

/// Delivery priority of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Default,
    Normal,
    High,
}

/// A local notification to be displayed on the device.
///
/// Constructed fresh per scheduling call; never persisted beyond it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Title shown in the notification shade.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Custom key-value data carried with the notification and handed back
    /// to the dispatcher when the user taps it.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    /// Whether the default sound plays on delivery.
    #[serde(default)]
    pub sound: bool,
    /// Delivery priority.
    #[serde(default)]
    pub priority: Priority,
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
            sound: true,
            priority: Priority::High,
        }
    }

    /// Attach a custom data field.
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// When a scheduled notification fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Trigger {
    /// Deliver as soon as possible.
    Immediate,
    /// Deliver after a relative delay.
    AfterDelay { seconds: u64 },
    /// Deliver at an absolute date/time. Past instants fire immediately.
    AtDateTime(DateTime<Utc>),
}

impl Trigger {
    /// The delay from `now` until the trigger is due.
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Trigger::Immediate => Duration::ZERO,
            Trigger::AfterDelay { seconds } => Duration::from_secs(*seconds),
            Trigger::AtDateTime(at) => (*at - now).to_std().unwrap_or(Duration::ZERO),
        }
    }
}

/// A notification that has been scheduled but has not yet fired.
///
/// Identifiers are opaque, assigned by the provider; the subsystem never
/// interprets them beyond storing and cancelling by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub identifier: String,
    pub request: NotificationRequest,
    pub trigger: Trigger,
}

/// Inbound notification payload, as consumed by the listener dispatcher.
///
/// Wire shape: `{"data": {"type": ..., ...}, "notification": {"title", "body"}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingNotification {
    /// Title of the displayed notification, if any.
    pub title: Option<String>,
    /// Body of the displayed notification, if any.
    pub body: Option<String>,
    /// Custom data payload carrying the `type` discriminator.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl From<&ScheduledNotification> for IncomingNotification {
    fn from(scheduled: &ScheduledNotification) -> Self {
        Self {
            title: Some(scheduled.request.title.clone()),
            body: Some(scheduled.request.body.clone()),
            data: scheduled.request.data.clone(),
        }
    }
}

/// Result of a registration call against the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    /// Whether the backend confirmed the registration.
    pub success: bool,
    /// Optional human-readable message echoed by the backend.
    pub message: Option<String>,
}

/// The closed set of domain actions a tapped notification can trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainAction {
    /// Open the lead detail screen.
    OpenLead { lead_id: i64 },
    /// Open the task screen, focused on a task when an id is present.
    OpenTask { task_id: Option<i64> },
    /// Open the announcements screen, focused when an id is present.
    OpenAnnouncement { announcement_id: Option<i64> },
}
