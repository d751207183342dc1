//! Transport contract tests against a mock sessions service.

use aca_sessions::{
    Error, HttpClientOptions, Payload, SessionsHttpClient, StaticCredential, TokenCache,
    TokenCredential, TokenProviderOptions, USER_AGENT,
};
use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(endpoint: &str, cache: Option<Arc<TokenCache>>) -> SessionsHttpClient {
    let options = HttpClientOptions::builder()
        .endpoint(endpoint)
        .api_version("2024-10-02-preview")
        .build()
        .expect("valid options");
    SessionsHttpClient::new(options, cache)
}

fn static_cache(token: &str) -> Arc<TokenCache> {
    Arc::new(TokenCache::new(
        Arc::new(StaticCredential::new(token)),
        TokenProviderOptions::default(),
    ))
}

struct FailingCredential;

#[async_trait]
impl TokenCredential for FailingCredential {
    async fn fetch_token(&self, _scopes: &[String]) -> aca_sessions::Result<aca_sessions::AccessToken> {
        Err(Error::Credential("issuer unavailable".into()))
    }
}

#[tokio::test]
async fn attaches_query_parameters_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("identifier", "sid-1"))
        .and(query_param("api-version", "2024-10-02-preview"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), None);
    client
        .send(Method::GET, "files", "sid-1", Payload::None)
        .await
        .expect("request should succeed");
}

#[tokio::test]
async fn attaches_bearer_token_when_credential_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), Some(static_cache("test-token")));
    client
        .send(Method::GET, "files", "sid-1", Payload::None)
        .await
        .expect("request should succeed");
}

#[tokio::test]
async fn sends_unauthenticated_without_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), None);
    client
        .send(Method::GET, "files", "sid-1", Payload::None)
        .await
        .expect("request should succeed");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn non_success_response_carries_url_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/executions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad request"))
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), None);
    let err = client
        .send(
            Method::POST,
            "executions",
            "sid-1",
            Payload::Json(serde_json::json!({})),
        )
        .await
        .expect_err("should fail");

    match &err {
        Error::RemoteService { url, status, body, .. } => {
            assert!(url.contains("/executions"));
            assert_eq!(*status, 400);
            assert_eq!(body, "Bad request");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(err.is_status(400));
    assert!(!err.is_status(500));

    // The rendered message is what upstream retry layers log.
    let message = err.to_string();
    assert!(message.contains(&server.uri()));
    assert!(message.contains("400"));
    assert!(message.contains("Bad request"));
}

#[tokio::test]
async fn network_failure_is_reported_as_transport_error() {
    // Grab an address, then shut the listener down so the connection is refused.
    // (A dropped wiremock MockServer returns to wiremock's server pool and keeps
    // listening, so it cannot be used to simulate a dead endpoint.)
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let uri = format!("http://{}", listener.local_addr().expect("local addr"));
    drop(listener);

    let client = client_for(&uri, None);
    let err = client
        .send(Method::GET, "files", "sid-1", Payload::None)
        .await
        .expect_err("should fail");

    match err {
        Error::Transport { url, .. } => assert!(url.contains("/files")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn credential_failure_surfaces_before_sending() {
    let server = MockServer::start().await;

    let cache = Arc::new(TokenCache::new(
        Arc::new(FailingCredential),
        TokenProviderOptions::default(),
    ));
    let client = client_for(&server.uri(), Some(cache));

    let err = client
        .send(Method::GET, "files", "sid-1", Payload::None)
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::Credential(_)));

    // Nothing reached the service.
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}
