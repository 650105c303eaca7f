//! Capability provider abstraction over the platform notification API.
//!
//! The runtime environment is probed once at startup; the detector then
//! selects one of two provider implementations for the process lifetime:
//!
//! - [`NullProvider`] for sandboxed runtimes, where every native operation
//!   degrades to a harmless no-op, and
//! - [`LocalProvider`] for native runtimes, which schedules notifications
//!   in-process with tokio timers and emits delivery/tap events on a
//!   broadcast stream.
//!
//! Call sites never probe for the native module themselves; they only talk
//! to the trait.

use crate::models::{IncomingNotification, NotificationRequest, ScheduledNotification, Trigger};
use chrono::Utc;
use estatify_common::{BoxFuture, BoxedError};
use estatify_config::ChannelConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Capacity of the provider event stream. Undelivered events are dropped
/// oldest-first once a subscriber lags this far behind.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Outcome of a notification permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// An event emitted by the platform notification layer.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// A notification was delivered while the app was foregrounded.
    Received(IncomingNotification),
    /// The user tapped a notification.
    Tapped(IncomingNotification),
}

/// Abstraction over the platform's native notification/messaging API.
///
/// Substitutable with a no-op implementation in restricted environments.
pub trait CapabilityProvider: Send + Sync {
    /// Ask the platform for notification permission.
    fn request_permission(&self) -> BoxFuture<'_, PermissionStatus, BoxedError>;

    /// Fetch a delivery token from the native messaging gateway, passing the
    /// installation identity.
    fn device_token(&self, installation_id: &str) -> BoxFuture<'_, String, BoxedError>;

    /// Configure the default delivery channel. Idempotent.
    fn ensure_channel(&self, channel: &ChannelConfig) -> BoxFuture<'_, (), BoxedError>;

    /// Schedule a notification; returns the opaque identifier assigned by
    /// the platform layer.
    fn schedule(
        &self,
        request: NotificationRequest,
        trigger: Trigger,
    ) -> BoxFuture<'_, String, BoxedError>;

    /// Cancel one pending notification by identifier.
    fn cancel(&self, identifier: &str) -> BoxFuture<'_, (), BoxedError>;

    /// Cancel all pending notifications.
    fn cancel_all(&self) -> BoxFuture<'_, (), BoxedError>;

    /// List notifications that are scheduled but have not yet fired.
    fn pending(&self) -> BoxFuture<'_, Vec<ScheduledNotification>, BoxedError>;

    /// Subscribe to delivery and tap events.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// No-op provider for sandboxed runtimes.
///
/// Permission is always denied, token fetches fail, and scheduling returns a
/// locally generated placeholder identifier without doing any real work, so
/// callers can exercise their own logic without crashing.
pub struct NullProvider {
    events: broadcast::Sender<ProviderEvent>,
}

impl Default for NullProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NullProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { events }
    }
}

impl CapabilityProvider for NullProvider {
    fn request_permission(&self) -> BoxFuture<'_, PermissionStatus, BoxedError> {
        Box::pin(async { Ok(PermissionStatus::Denied) })
    }

    fn device_token(&self, _installation_id: &str) -> BoxFuture<'_, String, BoxedError> {
        Box::pin(async {
            Err(BoxedError::msg(
                "native messaging module is not available in a sandboxed runtime",
            ))
        })
    }

    fn ensure_channel(&self, _channel: &ChannelConfig) -> BoxFuture<'_, (), BoxedError> {
        Box::pin(async { Ok(()) })
    }

    fn schedule(
        &self,
        request: NotificationRequest,
        _trigger: Trigger,
    ) -> BoxFuture<'_, String, BoxedError> {
        Box::pin(async move {
            let identifier = format!("noop-{}", Uuid::new_v4());
            debug!(%identifier, title = %request.title, "sandboxed schedule, no-op");
            Ok(identifier)
        })
    }

    fn cancel(&self, _identifier: &str) -> BoxFuture<'_, (), BoxedError> {
        Box::pin(async { Ok(()) })
    }

    fn cancel_all(&self) -> BoxFuture<'_, (), BoxedError> {
        Box::pin(async { Ok(()) })
    }

    fn pending(&self) -> BoxFuture<'_, Vec<ScheduledNotification>, BoxedError> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

struct PendingEntry {
    notification: ScheduledNotification,
    // None only for the brief window between insertion and task spawn.
    handle: Option<JoinHandle<()>>,
}

/// In-process provider for native runtimes.
///
/// Schedules notifications with tokio timers, keeps a pending map keyed by
/// the assigned identifier, and emits [`ProviderEvent`]s when notifications
/// fire or when the platform glue reports a user tap via [`LocalProvider::emit`].
pub struct LocalProvider {
    permission_granted: bool,
    fail_token_fetch: bool,
    pending: Arc<Mutex<HashMap<String, PendingEntry>>>,
    events: broadcast::Sender<ProviderEvent>,
    channel_inits: AtomicUsize,
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            permission_granted: true,
            fail_token_fetch: false,
            pending: Arc::new(Mutex::new(HashMap::new())),
            events,
            channel_inits: AtomicUsize::new(0),
        }
    }

    /// Control the outcome of the permission prompt (simulated in-process).
    pub fn with_permission(mut self, granted: bool) -> Self {
        self.permission_granted = granted;
        self
    }

    /// Make token fetches fail, exercising fallback synthesis in callers.
    pub fn with_failing_token_fetch(mut self) -> Self {
        self.fail_token_fetch = true;
        self
    }

    /// Inject an event as if the platform delivered it (used by the platform
    /// glue for taps, and by tests).
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    /// How many times the delivery channel has been configured.
    pub fn channel_init_count(&self) -> usize {
        self.channel_inits.load(Ordering::SeqCst)
    }

    fn pending_lock(&self) -> MutexGuard<'_, HashMap<String, PendingEntry>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CapabilityProvider for LocalProvider {
    fn request_permission(&self) -> BoxFuture<'_, PermissionStatus, BoxedError> {
        let status = if self.permission_granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        Box::pin(async move { Ok(status) })
    }

    fn device_token(&self, installation_id: &str) -> BoxFuture<'_, String, BoxedError> {
        let installation_id = installation_id.to_string();
        let fail = self.fail_token_fetch;
        Box::pin(async move {
            if fail {
                return Err(BoxedError::msg("messaging gateway did not return a token"));
            }
            Ok(format!("gw-{}", installation_id))
        })
    }

    fn ensure_channel(&self, channel: &ChannelConfig) -> BoxFuture<'_, (), BoxedError> {
        let channel = channel.clone();
        Box::pin(async move {
            let inits = self.channel_inits.fetch_add(1, Ordering::SeqCst);
            if inits == 0 {
                info!(
                    channel = %channel.id,
                    importance = %channel.importance,
                    sound = channel.sound,
                    "delivery channel configured"
                );
            }
            Ok(())
        })
    }

    fn schedule(
        &self,
        request: NotificationRequest,
        trigger: Trigger,
    ) -> BoxFuture<'_, String, BoxedError> {
        Box::pin(async move {
            let identifier = Uuid::new_v4().to_string();
            let notification = ScheduledNotification {
                identifier: identifier.clone(),
                request,
                trigger: trigger.clone(),
            };
            let delay = trigger.delay_from(Utc::now());

            self.pending_lock().insert(
                identifier.clone(),
                PendingEntry {
                    notification,
                    handle: None,
                },
            );

            let pending = Arc::clone(&self.pending);
            let events = self.events.clone();
            let fire_id = identifier.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let fired = pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&fire_id);
                if let Some(entry) = fired {
                    debug!(identifier = %fire_id, "notification fired");
                    let _ = events.send(ProviderEvent::Received(IncomingNotification::from(
                        &entry.notification,
                    )));
                }
            });

            // The timer task may already have fired for zero-delay triggers;
            // in that case the entry is gone and the handle is dropped.
            if let Some(entry) = self.pending_lock().get_mut(&identifier) {
                entry.handle = Some(handle);
            }

            Ok(identifier)
        })
    }

    fn cancel(&self, identifier: &str) -> BoxFuture<'_, (), BoxedError> {
        let identifier = identifier.to_string();
        Box::pin(async move {
            if let Some(entry) = self.pending_lock().remove(&identifier) {
                if let Some(handle) = entry.handle {
                    handle.abort();
                }
                debug!(%identifier, "pending notification cancelled");
            }
            Ok(())
        })
    }

    fn cancel_all(&self) -> BoxFuture<'_, (), BoxedError> {
        Box::pin(async move {
            let entries: Vec<PendingEntry> = self.pending_lock().drain().map(|(_, e)| e).collect();
            let count = entries.len();
            for entry in entries {
                if let Some(handle) = entry.handle {
                    handle.abort();
                }
            }
            if count > 0 {
                debug!(count, "all pending notifications cancelled");
            }
            Ok(())
        })
    }

    fn pending(&self) -> BoxFuture<'_, Vec<ScheduledNotification>, BoxedError> {
        Box::pin(async move {
            Ok(self
                .pending_lock()
                .values()
                .map(|entry| entry.notification.clone())
                .collect())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
