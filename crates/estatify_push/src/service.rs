//! Push service factory.
//!
//! Builds the whole push stack from configuration with explicitly
//! constructed, dependency-injected service objects. There is no ambient
//! global state: consumers hold the returned [`PushServices`] and pass the
//! pieces to whoever needs them.

use crate::acquirer::TokenAcquirer;
use crate::client::BackendClient;
use crate::dispatcher::{ActionHandler, ListenerDispatcher};
use crate::environment::{self, Environment};
use crate::provider::{CapabilityProvider, LocalProvider, NullProvider};
use crate::registry::TokenRegistry;
use crate::scheduler::NotificationScheduler;
use crate::session::SessionLifecycle;
use estatify_common::KeyValueStore;
use estatify_config::AppConfig;
use std::sync::Arc;
use tracing::info;

/// The fully wired push subsystem.
pub struct PushServices {
    pub environment: Environment,
    pub provider: Arc<dyn CapabilityProvider>,
    pub registry: Arc<TokenRegistry>,
    pub acquirer: Arc<TokenAcquirer>,
    pub scheduler: Arc<NotificationScheduler>,
    pub dispatcher: Arc<ListenerDispatcher>,
    pub session: SessionLifecycle,
}

impl PushServices {
    /// Build the stack, detecting the environment from the runtime
    /// configuration (memoized for the process lifetime).
    pub fn build(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        let environment = environment::detect(&config.runtime);
        Self::build_with_environment(environment, config, store, handler)
    }

    /// Build the stack for an explicit environment classification.
    ///
    /// The detector selects the provider implementation once here; no other
    /// component probes for native capability.
    pub fn build_with_environment(
        environment: Environment,
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        let provider: Arc<dyn CapabilityProvider> = if environment.is_native() {
            Arc::new(LocalProvider::new())
        } else {
            Arc::new(NullProvider::new())
        };

        let registry = Arc::new(TokenRegistry::new(
            BackendClient::new(&config.backend),
            store.clone(),
            config.runtime.device_type.clone(),
            config.push.register_fallback_tokens,
        ));
        let acquirer = Arc::new(TokenAcquirer::new(
            environment,
            provider.clone(),
            registry.clone(),
            store,
            config.push.fallback_prefix.clone(),
        ));
        let scheduler = Arc::new(NotificationScheduler::new(
            environment,
            provider.clone(),
            config.push.channel.clone(),
        ));
        let dispatcher = Arc::new(ListenerDispatcher::new(provider.clone(), handler));
        let session = SessionLifecycle::new(acquirer.clone(), registry.clone());

        info!(?environment, "push services built");
        Self {
            environment,
            provider,
            registry,
            acquirer,
            scheduler,
            dispatcher,
            session,
        }
    }

    /// Release the dispatcher subscription. Idempotent.
    pub fn dispose(&self) {
        self.dispatcher.stop();
    }
}
