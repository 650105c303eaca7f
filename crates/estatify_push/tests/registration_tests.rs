//! Contract tests for the token registry against a mock backend.

use estatify_common::{JsonFileStore, KeyValueStore, MemoryStore};
use estatify_config::BackendConfig;
use estatify_push::client::BackendClient;
use estatify_push::models::DeviceToken;
use estatify_push::registry::{TokenRegistry, PUSH_TOKEN_KEY, SESSION_TOKEN_KEY};
use estatify_push::PushError;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registry_for(server: &MockServer, store: Arc<MemoryStore>) -> TokenRegistry {
    let client = BackendClient::new(&BackendConfig {
        base_url: server.uri(),
    });
    TokenRegistry::new(client, store, "android", true)
}

async fn store_with_session() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.put(SESSION_TOKEN_KEY, "sess-abc").await.unwrap();
    store
}

#[tokio::test]
async fn register_persists_token_and_caches_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/register"))
        .and(header("Authorization", "Bearer sess-abc"))
        .and(body_json(json!({"pushToken": "tok-1", "deviceType": "android"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "registered"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with_session().await;
    let registry = registry_for(&server, store.clone());

    let outcome = registry
        .register_token(&DeviceToken::native("tok-1"))
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("registered"));

    assert_eq!(
        store.get(PUSH_TOKEN_KEY).await.unwrap(),
        Some("tok-1".to_string())
    );
    assert!(registry.is_token_registered().await);
    assert_eq!(registry.current_token().await.unwrap().value, "tok-1");
}

#[tokio::test]
async fn registering_the_same_token_twice_is_idempotent() {
    let server = MockServer::start().await;
    // No de-duplication is claimed: the backend is called exactly twice.
    Mock::given(method("POST"))
        .and(path("/push-notifications/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let store = store_with_session().await;
    let registry = registry_for(&server, store);
    let token = DeviceToken::native("tok-1");

    registry.register_token(&token).await.unwrap();
    registry.register_token(&token).await.unwrap();

    assert_eq!(registry.current_token().await.unwrap().value, "tok-1");
}

#[tokio::test]
async fn registering_a_new_token_supersedes_the_old_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let store = store_with_session().await;
    let registry = registry_for(&server, store.clone());

    registry
        .register_token(&DeviceToken::native("tok-old"))
        .await
        .unwrap();
    registry
        .register_token(&DeviceToken::native("tok-new"))
        .await
        .unwrap();

    assert_eq!(registry.current_token().await.unwrap().value, "tok-new");
    assert_eq!(
        store.get(PUSH_TOKEN_KEY).await.unwrap(),
        Some("tok-new".to_string())
    );
}

#[tokio::test]
async fn missing_session_fails_fast_without_a_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new()); // no session token
    let registry = registry_for(&server, store);

    let err = registry
        .register_token(&DeviceToken::native("tok-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, PushError::AuthMissing));
}

#[tokio::test]
async fn backend_rejection_echoes_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/register"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let store = store_with_session().await;
    let registry = registry_for(&server, store.clone());

    let err = registry
        .register_token(&DeviceToken::native("tok-1"))
        .await
        .unwrap_err();
    match err {
        PushError::BackendError { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Nothing was persisted on failure.
    assert_eq!(store.get(PUSH_TOKEN_KEY).await.unwrap(), None);
    assert!(!registry.is_token_registered().await);
}

#[tokio::test]
async fn deactivation_clears_local_copies_on_backend_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/logout"))
        .and(header("Authorization", "Bearer sess-abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with_session().await;
    let registry = registry_for(&server, store.clone());
    registry
        .register_token(&DeviceToken::native("tok-1"))
        .await
        .unwrap();

    registry.deactivate_token().await.unwrap();

    assert_eq!(store.get(PUSH_TOKEN_KEY).await.unwrap(), None);
    assert!(registry.current_token().await.is_none());
    assert!(!registry.is_token_registered().await);
}

#[tokio::test]
async fn failed_deactivation_keeps_the_local_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = store_with_session().await;
    let registry = registry_for(&server, store.clone());
    registry
        .register_token(&DeviceToken::native("tok-1"))
        .await
        .unwrap();

    let err = registry.deactivate_token().await.unwrap_err();
    assert!(matches!(err, PushError::BackendError { status: 500, .. }));

    // The backend still has the token, so the local copy is not lost.
    assert_eq!(
        store.get(PUSH_TOKEN_KEY).await.unwrap(),
        Some("tok-1".to_string())
    );
    assert!(registry.is_token_registered().await);
}

#[tokio::test]
async fn refresh_resends_the_durable_token_after_a_cold_start() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/register"))
        .and(body_json(json!({"pushToken": "tok-cold", "deviceType": "android"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    // Simulate a restart: durable storage has the token, memory does not.
    let store = store_with_session().await;
    store.put(PUSH_TOKEN_KEY, "tok-cold").await.unwrap();
    let registry = registry_for(&server, store);

    let outcome = registry.refresh_registration().await.unwrap();
    assert!(outcome.success);
}

#[tokio::test]
async fn refresh_without_a_cached_token_fails() {
    let server = MockServer::start().await;
    let store = store_with_session().await;
    let registry = registry_for(&server, store);

    let err = registry.refresh_registration().await.unwrap_err();
    assert!(matches!(err, PushError::NoTokenAvailable));
}

#[tokio::test]
async fn corrupt_durable_storage_degrades_to_no_token() {
    // A broken storage file must not crash lookups; the registry logs the
    // failure and reports no current token.
    let path = std::env::temp_dir().join(format!(
        "estatify-registry-corrupt-{}.json",
        uuid::Uuid::new_v4()
    ));
    tokio::fs::write(&path, "not json at all {").await.unwrap();

    let store = Arc::new(JsonFileStore::new(&path));
    let client = BackendClient::new(&BackendConfig::default());
    let registry = TokenRegistry::new(client, store, "android", true);

    assert!(registry.current_token().await.is_none());
    assert!(!registry.is_token_registered().await);

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn fallback_tokens_are_refused_when_policy_forbids_them() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = store_with_session().await;
    let client = BackendClient::new(&BackendConfig {
        base_url: server.uri(),
    });
    let registry = TokenRegistry::new(client, store, "android", false);

    let err = registry
        .register_token(&DeviceToken::fallback("estatify-fallback-1-a"))
        .await
        .unwrap_err();
    assert!(matches!(err, PushError::CapabilityUnavailable));
}

#[tokio::test]
async fn fallback_tokens_are_sent_under_the_default_policy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push-notifications/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with_session().await;
    let registry = registry_for(&server, store);

    let outcome = registry
        .register_token(&DeviceToken::fallback("estatify-fallback-1-a"))
        .await
        .unwrap();
    assert!(outcome.success);
}
