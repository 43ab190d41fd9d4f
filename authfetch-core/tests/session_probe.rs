//! Integration tests for the session probe.

use authfetch_core::{
    Account, AuthConfig, AuthContext, FetchClient, FetchError, MemoryTokenProvider,
    SessionAction, SessionProbe, SessionState,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn probe_for(
    server: &MockServer,
    provider: Arc<MemoryTokenProvider>,
) -> (SessionProbe<MemoryTokenProvider>, Arc<AuthContext>) {
    let mut config = AuthConfig::default();
    config.api.base_url = server.uri();

    let client = Arc::new(FetchClient::builder(provider).config(&config).build().unwrap());
    let context = Arc::new(AuthContext::new());
    let probe = SessionProbe::from_config(client, context.clone(), &config);
    (probe, context)
}

#[tokio::test]
async fn test_probe_publishes_unauthenticated_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user-info"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"isAuthenticated": false, "name": ""})),
        )
        .mount(&server)
        .await;

    let (probe, context) = probe_for(&server, Arc::new(MemoryTokenProvider::new()));
    context.dispatch(SessionAction::SetIsAuthenticated(true));

    let info = probe.probe().await.unwrap();
    assert!(!info.is_authenticated);

    let status = probe.status();
    assert!(status.is_loaded);
    assert!(!status.is_authenticated);
    assert!(status.error.is_none());
    assert_eq!(context.snapshot(), SessionState::default());
}

#[tokio::test]
async fn test_probe_sends_bearer_and_publishes_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user-info"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"isAuthenticated": true, "name": "Ada Lovelace"})),
        )
        .mount(&server)
        .await;

    let provider = Arc::new(MemoryTokenProvider::signed_in(
        Account::new("oid", "ada@example.com"),
        "abc",
    ));
    let (probe, context) = probe_for(&server, provider);

    probe.probe().await.unwrap();

    let status = probe.status();
    assert!(status.is_authenticated);
    assert_eq!(status.user_info.unwrap().name, "Ada Lovelace");
    assert_eq!(
        context.snapshot(),
        SessionState {
            is_authenticated: true,
            username: "Ada Lovelace".to_string(),
        }
    );
}

#[tokio::test]
async fn test_local_account_alone_is_not_authenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user-info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"isAuthenticated": "true", "name": "ada"})),
        )
        .mount(&server)
        .await;

    let provider = Arc::new(MemoryTokenProvider::signed_in(
        Account::new("oid", "ada@example.com"),
        "abc",
    ));
    let (probe, context) = probe_for(&server, provider);

    probe.probe().await.unwrap();

    assert!(!probe.status().is_authenticated);
    assert!(!context.snapshot().is_authenticated);
    assert_eq!(context.snapshot().username, "ada");
}

#[tokio::test]
async fn test_probe_failure_keeps_published_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user-info"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"isAuthenticated": true, "name": "Ada"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user-info"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (probe, context) = probe_for(&server, Arc::new(MemoryTokenProvider::new()));

    probe.probe().await.unwrap();
    let err = probe.probe().await.unwrap_err();
    assert_eq!(err, FetchError::RequestFailed { status: 503 });

    let status = probe.status();
    assert!(status.is_loaded);
    assert!(status.is_authenticated);
    assert_eq!(status.error, Some(err));
    assert_eq!(
        context.snapshot(),
        SessionState {
            is_authenticated: true,
            username: "Ada".to_string(),
        }
    );
}

#[tokio::test]
async fn test_probe_failure_before_first_load() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user-info"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (probe, context) = probe_for(&server, Arc::new(MemoryTokenProvider::new()));

    assert!(probe.probe().await.is_err());

    let status = probe.status();
    assert!(!status.is_loaded);
    assert!(!status.is_authenticated);
    assert!(status.user_info.is_none());
    assert_eq!(status.error.and_then(|e| e.status()), Some(401));
    assert_eq!(context.snapshot(), SessionState::default());
}

#[tokio::test]
async fn test_probe_rejects_non_object_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "a", "user"])))
        .mount(&server)
        .await;

    let (probe, _context) = probe_for(&server, Arc::new(MemoryTokenProvider::new()));

    let err = probe.probe().await.unwrap_err();
    assert!(matches!(err, FetchError::ParseError { .. }));
    assert!(!probe.status().is_loaded);
}
