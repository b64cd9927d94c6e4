//! AuthenticatedTransport against a mock API server
//!
//! Verifies:
//! - Every request carries `Authorization: Bearer <token>`
//! - A failed token acquisition never reaches the network
//! - Non-success statuses map onto the error taxonomy
//! - Timeouts surface as transport errors

use async_trait::async_trait;
use gantry_gcp::auth::{Credential, Scopes, StaticTokenProvider, TokenProvider};
use gantry_gcp::config::{ApiEndpoint, GcpConfig};
use gantry_gcp::transport::AuthenticatedTransport;
use gantry_gcp::{Error, Stage};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FailingProvider;

#[async_trait]
impl TokenProvider for FailingProvider {
    async fn token(&self, _scopes: &Scopes) -> gantry_gcp::Result<Credential> {
        Err(Error::Authentication("metadata server unreachable".to_string()))
    }
}

fn transport(server: &MockServer, provider: Arc<dyn TokenProvider>) -> AuthenticatedTransport {
    let config = GcpConfig::new("p", "l").with_api_root(server.uri());
    AuthenticatedTransport::new(&config, ApiEndpoint::PUBSUB, provider).unwrap()
}

#[tokio::test]
async fn attaches_bearer_token_to_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/p/topics/t"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "projects/p/topics/t"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/projects/p/topics/t"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({"labels": {"env": "dev"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "projects/p/topics/t"})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server, Arc::new(StaticTokenProvider::new("test-token")));
    for _ in 0..2 {
        let value: serde_json::Value = transport
            .execute(Method::GET, "projects/p/topics/t", &[], None)
            .await
            .unwrap();
        assert_eq!(value["name"], "projects/p/topics/t");
    }
    transport
        .send(
            Method::PUT,
            "projects/p/topics/t",
            &[],
            Some(&json!({"labels": {"env": "dev"}})),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn auth_failure_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let transport = transport(&server, Arc::new(FailingProvider));
    let err = transport
        .send(Method::GET, "projects/p/topics/t", &[], None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authentication(_)));
    assert_eq!(err.stage(), Stage::Auth);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server, Arc::new(StaticTokenProvider::new("stale")));
    let err = transport
        .execute::<serde_json::Value>(Method::GET, "projects/p/topics/t", &[], None)
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Response);
    assert_eq!(err.status(), Some(401));
    match err {
        Error::Unauthorized { resource, body } => {
            assert_eq!(resource, "projects/p/topics/t");
            assert_eq!(body, "token expired");
        }
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/p/topics/t"))
        .and(query_param("view", "FULL"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let transport = transport(&server, Arc::new(StaticTokenProvider::new("t")));
    let err = transport
        .execute::<serde_json::Value>(
            Method::GET,
            "projects/p/topics/t",
            &[("view", "FULL".to_string())],
            None,
        )
        .await
        .unwrap_err();

    match err {
        Error::ResourceClient { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "backend unavailable");
        }
        other => panic!("expected ResourceClient, got {:?}", other),
    }
}

#[tokio::test]
async fn raw_response_is_returned_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
        .mount(&server)
        .await;

    let transport = transport(&server, Arc::new(StaticTokenProvider::new("t")));
    let response = transport
        .send(Method::DELETE, "projects/p/topics/t", &[], None)
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 409);
    assert!(!response.is_success());
    assert_eq!(response.text(), "conflict");
}

#[tokio::test]
async fn timeout_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let config = GcpConfig::new("p", "l")
        .with_api_root(server.uri())
        .with_request_timeout(Duration::from_millis(50));
    let transport = AuthenticatedTransport::new(
        &config,
        ApiEndpoint::PUBSUB,
        Arc::new(StaticTokenProvider::new("t")),
    )
    .unwrap();

    let err = transport
        .send(Method::GET, "projects/p/topics/t", &[], None)
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Transport);
    match err {
        Error::Transport(e) => assert!(e.is_timeout()),
        other => panic!("expected Transport, got {:?}", other),
    }
}
