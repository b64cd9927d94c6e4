//! Mock implementations for Google APIs and credentials

use async_trait::async_trait;
use gantry_gcp::auth::{Credential, Scopes, TokenProvider};
use gantry_gcp::{Error, GcpConfig, Result};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Mock Google REST API
///
/// Point a client at it with [`MockGoogleApi::config`]; paths include the
/// API version (`/v1/projects/p/topics/t`).
pub struct MockGoogleApi {
    server: MockServer,
}

impl MockGoogleApi {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Config for `project`/`location` whose API root is this server
    pub fn config(&self, project_id: &str, location_id: &str) -> GcpConfig {
        GcpConfig::new(project_id, location_id).with_api_root(self.server.uri())
    }

    /// Respond to `verb path` with `status` and a JSON body
    pub async fn mount_json(&self, verb: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Respond to `verb path` with a Google-style 404
    pub async fn mount_not_found(&self, verb: &str, route: &str) {
        self.mount_json(
            verb,
            route,
            404,
            serde_json::json!({
                "error": { "code": 404, "message": "Resource not found", "status": "NOT_FOUND" }
            }),
        )
        .await;
    }

    /// All requests received so far
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Requests received for `verb path`
    pub async fn requests_to(&self, verb: &str, route: &str) -> Vec<Request> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method.as_str() == verb && r.url.path() == route)
            .collect()
    }
}

/// Fixed token that counts how often it was asked for
pub struct CountingTokenProvider {
    token: String,
    calls: AtomicUsize,
}

impl CountingTokenProvider {
    pub fn new(token: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            token: token.into(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for CountingTokenProvider {
    async fn token(&self, scopes: &Scopes) -> Result<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Credential {
            token: self.token.clone(),
            scopes: scopes.clone(),
            expires_at: None,
        })
    }
}

/// Always fails, as an unreachable metadata server would
pub struct FailingTokenProvider;

#[async_trait]
impl TokenProvider for FailingTokenProvider {
    async fn token(&self, _scopes: &Scopes) -> Result<Credential> {
        Err(Error::Authentication(
            "Failed to get token from metadata server".to_string(),
        ))
    }
}
