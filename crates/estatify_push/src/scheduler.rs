//! Local notification scheduling.
//!
//! Every call consults the environment classification first. In a sandboxed
//! runtime scheduling degrades to a locally generated placeholder identifier
//! and no provider call is made, so callers can exercise their own logic
//! without crashing; cancellation and listing are corresponding no-ops.

use crate::environment::Environment;
use crate::error::PushError;
use crate::models::{NotificationRequest, ScheduledNotification, Trigger};
use crate::provider::CapabilityProvider;
use chrono::{DateTime, Utc};
use estatify_config::ChannelConfig;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;
use uuid::Uuid;

/// Schedules, cancels and lists local notifications.
pub struct NotificationScheduler {
    environment: Environment,
    provider: Arc<dyn CapabilityProvider>,
    channel: ChannelConfig,
    channel_ready: OnceCell<()>,
}

impl NotificationScheduler {
    pub fn new(
        environment: Environment,
        provider: Arc<dyn CapabilityProvider>,
        channel: ChannelConfig,
    ) -> Self {
        Self {
            environment,
            provider,
            channel,
            channel_ready: OnceCell::new(),
        }
    }

    /// Configure the default delivery channel. Idempotent: the provider is
    /// asked at most once per scheduler instance.
    pub async fn ensure_channel(&self) -> Result<(), PushError> {
        if !self.environment.is_native() {
            return Ok(());
        }
        self.channel_ready
            .get_or_try_init(|| async {
                self.provider
                    .ensure_channel(&self.channel)
                    .await
                    .map_err(|e| PushError::SchedulingFailed(e.to_string()))
            })
            .await?;
        Ok(())
    }

    /// Schedule a notification for immediate delivery.
    pub async fn schedule_immediate(
        &self,
        request: NotificationRequest,
    ) -> Result<String, PushError> {
        self.schedule(request, Trigger::Immediate).await
    }

    /// Schedule a notification after a relative delay.
    pub async fn schedule_after_delay(
        &self,
        request: NotificationRequest,
        seconds: u64,
    ) -> Result<String, PushError> {
        self.schedule(request, Trigger::AfterDelay { seconds }).await
    }

    /// Schedule a notification at an absolute date/time.
    pub async fn schedule_at(
        &self,
        request: NotificationRequest,
        at: DateTime<Utc>,
    ) -> Result<String, PushError> {
        self.schedule(request, Trigger::AtDateTime(at)).await
    }

    async fn schedule(
        &self,
        request: NotificationRequest,
        trigger: Trigger,
    ) -> Result<String, PushError> {
        if !self.environment.is_native() {
            let identifier = format!("local-{}", Uuid::new_v4());
            debug!(
                component = "scheduler",
                %identifier,
                title = %request.title,
                "sandboxed environment, schedule is a no-op"
            );
            return Ok(identifier);
        }

        self.ensure_channel().await?;
        self.provider
            .schedule(request, trigger)
            .await
            .map_err(|e| PushError::SchedulingFailed(e.to_string()))
    }

    /// Cancel one pending notification by identifier.
    pub async fn cancel(&self, identifier: &str) -> Result<(), PushError> {
        if !self.environment.is_native() {
            return Ok(());
        }
        self.provider
            .cancel(identifier)
            .await
            .map_err(|e| PushError::SchedulingFailed(e.to_string()))
    }

    /// Cancel all pending notifications.
    pub async fn cancel_all(&self) -> Result<(), PushError> {
        if !self.environment.is_native() {
            return Ok(());
        }
        self.provider
            .cancel_all()
            .await
            .map_err(|e| PushError::SchedulingFailed(e.to_string()))
    }

    /// List notifications that are scheduled but have not yet fired.
    pub async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, PushError> {
        if !self.environment.is_native() {
            return Ok(Vec::new());
        }
        self.provider
            .pending()
            .await
            .map_err(|e| PushError::SchedulingFailed(e.to_string()))
    }
}
