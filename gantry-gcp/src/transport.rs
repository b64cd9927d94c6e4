//! Authenticated HTTP transport bound to one Google API

use crate::auth::{Scopes, TokenProvider};
use crate::config::{ApiEndpoint, GcpConfig};
use crate::metrics::{outcome_for_status, REQUEST_DURATION, REQUEST_TOTAL};
use crate::{Error, Result};
use bytes::Bytes;
use gantry_core::wire;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw response handed back unchanged for the caller to interpret
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, lossy on invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(wire::decode(&self.body)?)
    }

    /// Map a non-success status onto the error taxonomy.
    ///
    /// `404` becomes [`Error::NotFound`] for `resource`, `401`
    /// [`Error::Unauthorized`], anything else outside 2xx
    /// [`Error::ResourceClient`] with the raw body.
    pub fn into_success(self, resource: &str) -> Result<Self> {
        match self.status {
            s if s.is_success() => Ok(self),
            StatusCode::NOT_FOUND => Err(Error::NotFound {
                resource: resource.to_string(),
            }),
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized {
                resource: resource.to_string(),
                body: self.text(),
            }),
            status => Err(Error::ResourceClient {
                status: status.as_u16(),
                body: self.text(),
            }),
        }
    }
}

/// HTTP client for one API base URL that attaches a bearer token to every
/// request.
///
/// Tokens come from the injected [`TokenProvider`] once per request. There is
/// no retry on `401`; refresh policy belongs to the provider.
pub struct AuthenticatedTransport {
    service: &'static str,
    base_url: String,
    scopes: Scopes,
    provider: Arc<dyn TokenProvider>,
    http_client: reqwest::Client,
}

impl fmt::Debug for AuthenticatedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedTransport")
            .field("service", &self.service)
            .field("base_url", &self.base_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl AuthenticatedTransport {
    /// Create a transport for `endpoint`
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the HTTP client cannot be built
    pub fn new(
        config: &GcpConfig,
        endpoint: ApiEndpoint,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            service: endpoint.service,
            base_url: config.base_url(&endpoint),
            scopes: config.scopes_for(&endpoint),
            provider,
            http_client,
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    /// Absolute URL for a path relative to the base
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Before-send hook: acquire a credential and attach it.
    ///
    /// A provider failure surfaces as [`Error::Authentication`] and the
    /// request is never sent.
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let credential = self.provider.token(&self.scopes).await.map_err(|e| match e {
            Error::Authentication(msg) => Error::Authentication(msg),
            other => Error::Authentication(other.to_string()),
        })?;
        Ok(request.bearer_auth(credential.token))
    }

    /// Perform one round trip and read the full body
    #[tracing::instrument(
        name = "transport.send",
        skip_all,
        fields(service = self.service, method = %method, path = %path)
    )]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let mut request = self.http_client.request(method.clone(), self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let request = match self.authorize(request).await {
            Ok(request) => request,
            Err(e) => {
                REQUEST_TOTAL
                    .with_label_values(&[self.service, "auth_error"])
                    .inc();
                warn!(error = %e, "Token acquisition failed, request not sent");
                return Err(e);
            }
        };

        let timer = REQUEST_DURATION
            .with_label_values(&[self.service, method.as_str()])
            .start_timer();
        let result = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(ApiResponse { status, body })
        }
        .await;
        drop(timer);

        match result {
            Ok(response) => {
                REQUEST_TOTAL
                    .with_label_values(&[self.service, outcome_for_status(response.status.as_u16())])
                    .inc();
                debug!(status = %response.status, bytes = response.body.len(), "Response received");
                Ok(response)
            }
            Err(e) => {
                REQUEST_TOTAL
                    .with_label_values(&[self.service, "transport_error"])
                    .inc();
                warn!(error = %e, timeout = e.is_timeout(), "HTTP request failed");
                Err(Error::Transport(e))
            }
        }
    }

    /// Send, require a 2xx status and decode the body
    pub async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T> {
        self.send(method, path, query, body)
            .await?
            .into_success(path)?
            .decode()
    }

    /// Release the connection pool
    pub fn close(self) {
        debug!(service = self.service, "Closing transport");
        drop(self.http_client);
    }

    /// Close a shared transport if `transport` is its last handle.
    ///
    /// Returns `false` when other handles remain; the pool is then released
    /// when the last of them is dropped.
    pub fn close_shared(transport: Arc<Self>) -> bool {
        match Arc::try_unwrap(transport) {
            Ok(transport) => {
                transport.close();
                true
            }
            Err(shared) => {
                debug!(
                    service = shared.service,
                    remaining = Arc::strong_count(&shared) - 1,
                    "Transport still shared, close deferred"
                );
                false
            }
        }
    }
}
