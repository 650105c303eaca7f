//! Listener dispatcher.
//!
//! Registers exactly one foreground-received handler and one tap handler
//! against the provider's event stream, and routes tapped notifications to
//! domain actions by their `type` discriminator. `start` is idempotent and
//! `stop` is safe to call when never started, so login/logout flows can call
//! them unconditionally.

use crate::models::{DomainAction, IncomingNotification};
use crate::provider::{CapabilityProvider, ProviderEvent};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Receives routed domain actions and foreground delivery callbacks.
///
/// Injected by the host application; the subsystem never navigates itself.
pub trait ActionHandler: Send + Sync {
    /// A notification arrived while the app was foregrounded.
    fn notification_received(&self, notification: &IncomingNotification) {
        let _ = notification;
    }

    /// The user tapped a notification that routed to a domain action.
    fn handle_action(&self, action: DomainAction);
}

/// Routes provider events to the injected [`ActionHandler`].
pub struct ListenerDispatcher {
    provider: Arc<dyn CapabilityProvider>,
    handler: Arc<dyn ActionHandler>,
    subscription: Mutex<Option<JoinHandle<()>>>,
}

impl ListenerDispatcher {
    pub fn new(provider: Arc<dyn CapabilityProvider>, handler: Arc<dyn ActionHandler>) -> Self {
        Self {
            provider,
            handler,
            subscription: Mutex::new(None),
        }
    }

    fn subscription_lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.subscription.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Begin listening for provider events.
    ///
    /// Idempotent: a second call while a subscription is active is a no-op,
    /// so duplicate tap handling cannot occur.
    pub fn start(&self) {
        let mut guard = self.subscription_lock();
        if guard.is_some() {
            debug!(component = "dispatcher", "already started, skipping re-registration");
            return;
        }

        let mut events = self.provider.subscribe();
        let handler = Arc::clone(&self.handler);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ProviderEvent::Received(notification)) => {
                        debug!(
                            component = "dispatcher",
                            title = notification.title.as_deref().unwrap_or(""),
                            "notification received in foreground"
                        );
                        handler.notification_received(&notification);
                    }
                    Ok(ProviderEvent::Tapped(notification)) => {
                        if let Some(action) = route(&notification) {
                            debug!(component = "dispatcher", ?action, "dispatching tap action");
                            handler.handle_action(action);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(component = "dispatcher", skipped, "event stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        *guard = Some(task);
    }

    /// Release the subscription. Safe to call when never started.
    pub fn stop(&self) {
        if let Some(task) = self.subscription_lock().take() {
            task.abort();
            debug!(component = "dispatcher", "listener subscription released");
        }
    }
}

impl Drop for ListenerDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Route a tapped notification's payload to a domain action.
///
/// Unrecognized or malformed payloads are a logged no-op, never an error.
pub fn route(notification: &IncomingNotification) -> Option<DomainAction> {
    let kind = notification.data.get("type")?.as_str()?;
    match kind {
        "lead" => match notification.data.get("leadId").and_then(value_as_i64) {
            Some(lead_id) => Some(DomainAction::OpenLead { lead_id }),
            None => {
                debug!(component = "dispatcher", "lead payload without leadId, ignoring");
                None
            }
        },
        "task" => Some(DomainAction::OpenTask {
            task_id: notification.data.get("taskId").and_then(value_as_i64),
        }),
        "announcement" => Some(DomainAction::OpenAnnouncement {
            announcement_id: notification
                .data
                .get("announcementId")
                .and_then(value_as_i64),
        }),
        other => {
            debug!(component = "dispatcher", kind = other, "unknown notification type, ignoring");
            None
        }
    }
}

// Ids arrive as JSON numbers or stringified numbers depending on the sender.
fn value_as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
