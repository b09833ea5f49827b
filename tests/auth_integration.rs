//! Integration tests for the token service over a real HTTP refresh
//! transport, backed by wiremock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storefront_client::auth::{
    HttpRefreshClient, MemoryTokenStore, TokenKind, TokenService, TokenStore,
};
use storefront_client::config::ApiConfig;

const REFRESH_PATH: &str = "/api/v1/auth/refresh";

async fn service_for(
    server: &MockServer,
) -> (TokenService<HttpRefreshClient, MemoryTokenStore>, Arc<MemoryTokenStore>) {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
    let config = ApiConfig::new(server.uri());
    let store = Arc::new(MemoryTokenStore::new());
    let refresh = HttpRefreshClient::new(&config).expect("refresh client");
    (TokenService::new(refresh, Arc::clone(&store)), store)
}

fn failure_probe(
    service: &TokenService<HttpRefreshClient, MemoryTokenStore>,
) -> Arc<AtomicBool> {
    let fired = Arc::new(AtomicBool::new(false));
    let fired_clone = Arc::clone(&fired);
    service.set_auth_failure_listener(move || fired_clone.store(true, Ordering::SeqCst));
    fired
}

#[tokio::test]
async fn concurrent_refreshes_collapse_into_one_backend_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({ "refreshToken": "refresh-1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "accessToken": "fresh-access" } }))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (service, store) = service_for(&server).await;
    store.set(TokenKind::Refresh, "refresh-1").await.unwrap();

    let results = join_all((0..5).map(|_| service.perform_token_refresh())).await;

    for result in results {
        assert_eq!(result.as_deref(), Some("fresh-access"));
    }
    assert_eq!(
        store.get(TokenKind::Access).await.unwrap().as_deref(),
        Some("fresh-access")
    );
}

#[tokio::test]
async fn rejected_refresh_ends_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (service, store) = service_for(&server).await;
    store.set(TokenKind::Access, "stale-access").await.unwrap();
    store.set(TokenKind::Refresh, "revoked-refresh").await.unwrap();
    let fired = failure_probe(&service);

    assert_eq!(service.perform_token_refresh().await, None);

    assert!(fired.load(Ordering::SeqCst), "authoritative failure must fire the listener");
    assert_eq!(store.get(TokenKind::Access).await.unwrap(), None);
    assert_eq!(store.get(TokenKind::Refresh).await.unwrap(), None);
}

#[tokio::test]
async fn server_error_during_refresh_preserves_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (service, store) = service_for(&server).await;
    store.set(TokenKind::Refresh, "refresh-1").await.unwrap();
    let fired = failure_probe(&service);

    assert_eq!(service.perform_token_refresh().await, None);

    assert!(!fired.load(Ordering::SeqCst), "ambiguous failure must not fire the listener");
    assert_eq!(
        store.get(TokenKind::Refresh).await.unwrap().as_deref(),
        Some("refresh-1")
    );
}

#[tokio::test]
async fn success_without_access_token_is_ambiguous() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let (service, store) = service_for(&server).await;
    store.set(TokenKind::Refresh, "refresh-1").await.unwrap();
    let fired = failure_probe(&service);

    assert_eq!(service.perform_token_refresh().await, None);

    assert!(!fired.load(Ordering::SeqCst));
    assert_eq!(
        store.get(TokenKind::Refresh).await.unwrap().as_deref(),
        Some("refresh-1")
    );
}

#[tokio::test]
async fn missing_refresh_token_skips_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (service, _store) = service_for(&server).await;
    let fired = failure_probe(&service);

    assert_eq!(service.perform_token_refresh().await, None);
    assert!(fired.load(Ordering::SeqCst));
}

#[tokio::test]
async fn rotation_replaces_the_refresh_token_only_when_issued() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({ "accessToken": "fresh-access", "refreshToken": "rotated-refresh" }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let (service, store) = service_for(&server).await;
    store.set(TokenKind::Refresh, "old-refresh").await.unwrap();

    assert_eq!(service.perform_token_refresh().await.as_deref(), Some("fresh-access"));
    assert_eq!(
        store.get(TokenKind::Refresh).await.unwrap().as_deref(),
        Some("rotated-refresh")
    );
}
