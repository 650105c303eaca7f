//! Demo agent for the Estatify push subsystem.
//!
//! Loads configuration, builds the push stack, and drives a full session:
//! start listening, log in (acquire + register the device token), schedule a
//! welcome notification, then deactivate on ctrl-c. Useful for exercising
//! the subsystem against a real backend without the mobile app.

use estatify_common::{logging, JsonFileStore, KeyValueStore, MemoryStore};
use estatify_config::load_config;
use estatify_push::{ActionHandler, DomainAction, IncomingNotification, NotificationRequest, PushServices};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Logs routed actions instead of navigating; the agent has no UI.
struct LoggingActionHandler;

impl ActionHandler for LoggingActionHandler {
    fn notification_received(&self, notification: &IncomingNotification) {
        info!(
            title = notification.title.as_deref().unwrap_or(""),
            "notification received"
        );
    }

    fn handle_action(&self, action: DomainAction) {
        info!(?action, "tap routed to domain action");
    }
}

#[tokio::main]
async fn main() {
    logging::init();
    let config = Arc::new(load_config().expect("Failed to load config"));

    let store: Arc<dyn KeyValueStore> = match &config.push.storage_path {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    };

    let services = PushServices::build(&config, store, Arc::new(LoggingActionHandler));
    services.dispatcher.start();

    let report = services.session.on_login().await;
    info!(
        registered = report.registered,
        token = report.token.as_ref().map(|t| t.value.as_str()).unwrap_or("<none>"),
        "login sequence finished"
    );

    let welcome = NotificationRequest::new("Welcome back", "You have new leads waiting")
        .with_data("type", json!("lead"))
        .with_data("leadId", json!(42));
    match services.scheduler.schedule_after_delay(welcome, 2).await {
        Ok(identifier) => info!(%identifier, "welcome notification scheduled"),
        Err(e) => warn!(error = %e, "could not schedule welcome notification"),
    }

    info!("running; press ctrl-c to log out and exit");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "shutdown signal listener failed");
    }

    services.session.on_logout().await;
    services.dispose();
    info!("logged out, bye");
}
