use crate::acquirer::{TokenAcquirer, INSTALLATION_ID_KEY};
use crate::client::BackendClient;
use crate::environment::Environment;
use crate::models::TokenOrigin;
use crate::provider::{CapabilityProvider, LocalProvider, NullProvider};
use crate::registry::{TokenRegistry, PUSH_TOKEN_KEY};
use estatify_common::{KeyValueStore, MemoryStore};
use estatify_config::BackendConfig;
use std::sync::Arc;

fn registry(store: Arc<dyn KeyValueStore>) -> Arc<TokenRegistry> {
    // The backend is never reached in these tests; acquisition does not
    // perform network calls.
    let client = BackendClient::new(&BackendConfig::default());
    Arc::new(TokenRegistry::new(client, store, "android", true))
}

fn acquirer(
    environment: Environment,
    provider: Arc<dyn CapabilityProvider>,
    store: Arc<MemoryStore>,
) -> TokenAcquirer {
    let store: Arc<dyn KeyValueStore> = store;
    TokenAcquirer::new(
        environment,
        provider,
        registry(store.clone()),
        store,
        "estatify-fallback",
    )
}

#[tokio::test]
async fn sandboxed_runtime_refuses_acquisition() {
    let store = Arc::new(MemoryStore::new());
    let acquirer = acquirer(Environment::Sandboxed, Arc::new(NullProvider::new()), store);
    assert!(acquirer.get_token().await.is_none());
}

#[tokio::test]
async fn denied_permission_yields_no_token() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(LocalProvider::new().with_permission(false));
    let acquirer = acquirer(Environment::Native, provider, store);
    assert!(acquirer.get_token().await.is_none());
}

#[tokio::test]
async fn gateway_token_is_preferred() {
    let store = Arc::new(MemoryStore::new());
    let acquirer = acquirer(Environment::Native, Arc::new(LocalProvider::new()), store.clone());

    let token = acquirer.get_token().await.expect("token expected");
    assert_eq!(token.origin, TokenOrigin::NativeGateway);
    assert!(token.value.starts_with("gw-"));

    // The installation identity was minted and persisted on first use.
    let installation_id = store.get(INSTALLATION_ID_KEY).await.unwrap().unwrap();
    assert!(token.value.contains(&installation_id));
}

#[tokio::test]
async fn failing_gateway_fetch_synthesizes_fallback() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(LocalProvider::new().with_failing_token_fetch());
    let acquirer = acquirer(Environment::Native, provider, store);

    let token = acquirer.get_token().await.expect("fallback expected");
    assert_eq!(token.origin, TokenOrigin::SyntheticFallback);
    assert!(token.value.starts_with("estatify-fallback-"));
    // prefix, millisecond timestamp, random suffix
    assert_eq!(token.value.split('-').count(), 4);
}

#[tokio::test]
async fn cached_token_short_circuits_even_when_sandboxed() {
    let store = Arc::new(MemoryStore::new());
    store.put(PUSH_TOKEN_KEY, "tok-cached").await.unwrap();

    let acquirer = acquirer(Environment::Sandboxed, Arc::new(NullProvider::new()), store);
    let token = acquirer.get_token().await.expect("cached token expected");
    assert_eq!(token.value, "tok-cached");
}

#[tokio::test]
async fn repeated_acquisition_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(LocalProvider::new());
    let acquirer = acquirer(Environment::Native, provider, store);

    let first = acquirer.get_token().await.expect("token expected");
    let second = acquirer.get_token().await.expect("token expected");
    // No registration happened, so nothing is cached yet and acquisition
    // reruns, but the gateway token is stable for the installation.
    assert_eq!(first.value, second.value);
}
