//! Device notification token lifecycle and local dispatch for Estatify.
//!
//! This crate owns the one stateful corner of the mobile CRM: obtaining a
//! delivery token for this device + app installation, registering it with
//! the backend for the authenticated session, scheduling and cancelling
//! local notifications, and routing user taps on notifications back into
//! domain actions.
//!
//! # Degradation model
//!
//! The runtime is classified once at startup as `Sandboxed` or `Native`
//! ([`environment`]). In a sandboxed runtime every native operation degrades
//! to a harmless no-op: token acquisition returns `None`, scheduling returns
//! placeholder identifiers, and nothing crashes. Transient native failures
//! in a native runtime are absorbed by synthesizing a fallback token, so
//! dependent flows always receive *some* identifier.
//!
//! # Usage
//!
//! ```rust,no_run
//! use estatify_common::MemoryStore;
//! use estatify_config::AppConfig;
//! use estatify_push::dispatcher::ActionHandler;
//! use estatify_push::models::DomainAction;
//! use estatify_push::PushServices;
//! use std::sync::Arc;
//!
//! struct Navigator;
//! impl ActionHandler for Navigator {
//!     fn handle_action(&self, action: DomainAction) {
//!         println!("navigate: {:?}", action);
//!     }
//! }
//!
//! async fn run() {
//!     let config = AppConfig::default();
//!     let services =
//!         PushServices::build(&config, Arc::new(MemoryStore::new()), Arc::new(Navigator));
//!     services.dispatcher.start();
//!     let report = services.session.on_login().await;
//!     println!("registered: {}", report.registered);
//! }
//! ```

// Declare modules within this crate
pub mod acquirer;
#[cfg(test)]
mod acquirer_test;
pub mod client;
pub mod dispatcher;
pub mod environment;
pub mod error;
pub mod models;
pub mod provider;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod session;

// Re-export the types consumers touch most
pub use acquirer::TokenAcquirer;
pub use dispatcher::{ActionHandler, ListenerDispatcher};
pub use environment::Environment;
pub use error::PushError;
pub use models::{
    DeviceToken, DomainAction, IncomingNotification, NotificationRequest, Priority,
    RegistrationOutcome, ScheduledNotification, TokenOrigin, Trigger,
};
pub use provider::{CapabilityProvider, LocalProvider, NullProvider, ProviderEvent};
pub use registry::TokenRegistry;
pub use scheduler::NotificationScheduler;
pub use service::PushServices;
pub use session::{LoginReport, SessionLifecycle};
