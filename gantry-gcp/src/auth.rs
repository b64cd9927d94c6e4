//! GCP authentication and OAuth2 access tokens
//!
//! [`TokenProvider`] is the only thing the transport knows about credentials.
//! [`GcpAuth`] implements it in two modes:
//! - **Workload Identity**: uses the GCE metadata server
//! - **Service Account JSON**: signs a JWT assertion with a JSON key file
//!   and exchanges it at the key's `token_uri`

use crate::metrics::TOKEN_ACQUISITION_DURATION;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Ordered set of OAuth2 scope strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scopes(BTreeSet<String>);

impl Scopes {
    pub const CLOUD_PLATFORM: &'static str = "https://www.googleapis.com/auth/cloud-platform";
    pub const CLOUD_TASKS: &'static str = "https://www.googleapis.com/auth/cloud-tasks";
    pub const PUBSUB: &'static str = "https://www.googleapis.com/auth/pubsub";
    pub const CLOUD_SCHEDULER: &'static str = "https://www.googleapis.com/auth/cloud-scheduler";
    pub const SQL_ADMIN: &'static str = "https://www.googleapis.com/auth/sqlservice.admin";
    pub const DRIVE: &'static str = "https://www.googleapis.com/auth/drive";

    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            scopes
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.trim().is_empty())
                .collect(),
        )
    }

    pub fn single(scope: &str) -> Self {
        Self::new([scope])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Space-separated form used in JWT assertions
    pub fn joined(&self, separator: &str) -> String {
        self.iter().collect::<Vec<_>>().join(separator)
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined(" "))
    }
}

/// Bearer credential handed to the transport for a single request
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub scopes: Scopes,
    pub expires_at: Option<DateTime<Utc>>,
}

// Keep tokens out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Supplies bearer tokens for a set of scopes.
///
/// Implementations own any caching and refresh policy. A failure must be
/// reported as [`Error::Authentication`].
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self, scopes: &Scopes) -> Result<Credential>;
}

#[async_trait]
impl<T: TokenProvider + ?Sized> TokenProvider for Arc<T> {
    async fn token(&self, scopes: &Scopes) -> Result<Credential> {
        (**self).token(scopes).await
    }
}

/// Fixed token, for emulators, tests and tokens minted elsewhere
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self, scopes: &Scopes) -> Result<Credential> {
        if self.token.is_empty() {
            return Err(Error::Authentication("static token is empty".to_string()));
        }
        Ok(Credential {
            token: self.token.clone(),
            scopes: scopes.clone(),
            expires_at: None,
        })
    }
}

/// Service account credentials from GCP
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    #[serde(rename = "type")]
    account_type: String,
    private_key_id: String,
    private_key: String,
    client_email: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// OAuth2 access token with expiration
#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: Instant,
    expires_at_utc: DateTime<Utc>,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn from_response(response: TokenResponse) -> Self {
        // Subtract 5 minutes for safety margin
        let expires_in = response.expires_in.saturating_sub(300);
        let lifetime = Duration::from_secs(expires_in);
        let expires_at_utc = chrono::Duration::from_std(lifetime)
            .map(|d| Utc::now() + d)
            .unwrap_or_else(|_| Utc::now());

        debug!(
            token_type = %response.token_type,
            expires_in_seconds = expires_in,
            "OAuth2 access token acquired"
        );

        Self {
            token: response.access_token,
            expires_at: Instant::now() + lifetime,
            expires_at_utc,
        }
    }
}

/// Response from OAuth2 token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    token_type: String,
}

/// JWT claims for OAuth2 service account assertion
#[derive(Debug, Serialize)]
struct OAuth2Claims {
    iss: String,
    scope: String,
    aud: String,
    exp: u64,
    iat: u64,
}

/// GCE metadata server URL for Workload Identity
pub const METADATA_SERVER_URL: &str = "http://metadata.google.internal";

/// Header required for metadata server requests
const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR_VALUE: &str = "Google";

/// Authentication mode
#[derive(Debug, Clone)]
enum AuthMode {
    ServiceAccount(ServiceAccountCredentials),
    MetadataServer {
        base_url: String,
        service_account_email: String,
    },
}

/// OAuth2 access tokens for calling GCP APIs, cached per scope set
pub struct GcpAuth {
    auth_mode: AuthMode,
    http_client: reqwest::Client,
    access_token_cache: Arc<RwLock<HashMap<Scopes, AccessToken>>>,
}

impl GcpAuth {
    /// Create a new GCP auth from service account JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or is not a service account key
    pub fn from_service_account_json(service_account_json: &str) -> Result<Self> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(service_account_json)
            .map_err(|e| {
                Error::Authentication(format!("Failed to parse service account JSON: {}", e))
            })?;

        if credentials.account_type != "service_account" {
            return Err(Error::Authentication(format!(
                "Invalid account type: expected 'service_account', got '{}'",
                credentials.account_type
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Authentication(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            auth_mode: AuthMode::ServiceAccount(credentials),
            http_client,
            access_token_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Create a new GCP auth using the GCE metadata server (Workload Identity)
    pub async fn from_metadata_server() -> Result<Self> {
        Self::from_metadata_server_at(METADATA_SERVER_URL).await
    }

    /// Same as [`from_metadata_server`](Self::from_metadata_server) against
    /// an explicit metadata root
    pub async fn from_metadata_server_at(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5)) // Short timeout for metadata server
            .build()
            .map_err(|e| Error::Authentication(format!("Failed to create HTTP client: {}", e)))?;

        let email_url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/email",
            base_url
        );

        let response = http_client
            .get(&email_url)
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)
            .send()
            .await
            .map_err(|e| {
                Error::Authentication(format!(
                    "Failed to connect to metadata server (not running on GCP?): {}",
                    e
                ))
            })?;

        if !response.status().is_success() {
            return Err(Error::Authentication(format!(
                "Metadata server returned status {}",
                response.status()
            )));
        }

        let service_account_email = response.text().await.map_err(|e| {
            Error::Authentication(format!(
                "Failed to read service account email from metadata: {}",
                e
            ))
        })?;

        info!(
            service_account = %service_account_email,
            "Initialized GCP auth via metadata server (Workload Identity)"
        );

        Ok(Self {
            auth_mode: AuthMode::MetadataServer {
                base_url,
                service_account_email,
            },
            http_client,
            access_token_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Auto-detect authentication method
    ///
    /// Tries the following in order:
    /// 1. GCE metadata server (Workload Identity)
    /// 2. Service account JSON from `GCP_SERVICE_ACCOUNT_KEY_JSON` env var
    /// 3. Service account JSON from `GOOGLE_APPLICATION_CREDENTIALS` file
    pub async fn auto() -> Result<Self> {
        debug!("Attempting GCP auth via metadata server");
        match Self::from_metadata_server().await {
            Ok(auth) => {
                info!("Using GCP Workload Identity (metadata server)");
                return Ok(auth);
            }
            Err(e) => {
                debug!(error = %e, "Metadata server not available, trying service account");
            }
        }

        if let Ok(json) = std::env::var("GCP_SERVICE_ACCOUNT_KEY_JSON") {
            debug!("Attempting GCP auth via GCP_SERVICE_ACCOUNT_KEY_JSON env var");
            match Self::from_service_account_json(&json) {
                Ok(auth) => {
                    info!("Using GCP service account from GCP_SERVICE_ACCOUNT_KEY_JSON");
                    return Ok(auth);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse GCP_SERVICE_ACCOUNT_KEY_JSON");
                }
            }
        }

        if let Ok(path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
            debug!(path = %path, "Attempting GCP auth via GOOGLE_APPLICATION_CREDENTIALS file");
            match std::fs::read_to_string(&path) {
                Ok(json) => match Self::from_service_account_json(&json) {
                    Ok(auth) => {
                        info!(path = %path, "Using GCP service account from GOOGLE_APPLICATION_CREDENTIALS");
                        return Ok(auth);
                    }
                    Err(e) => {
                        warn!(error = %e, path = %path, "Failed to parse service account file");
                    }
                },
                Err(e) => {
                    warn!(error = %e, path = %path, "Failed to read GOOGLE_APPLICATION_CREDENTIALS file");
                }
            }
        }

        Err(Error::Authentication(
            "No GCP authentication available. On GCP, ensure the workload has a service account. \
             For local development, set GCP_SERVICE_ACCOUNT_KEY_JSON or GOOGLE_APPLICATION_CREDENTIALS."
                .to_string(),
        ))
    }

    /// Get the service account email
    pub fn service_account_email(&self) -> &str {
        match &self.auth_mode {
            AuthMode::ServiceAccount(creds) => &creds.client_email,
            AuthMode::MetadataServer {
                service_account_email,
                ..
            } => service_account_email,
        }
    }

    /// Get an OAuth2 access token for the given scopes
    ///
    /// Uses the cached token for this scope set if it has not expired.
    pub async fn access_token(&self, scopes: &Scopes) -> Result<Credential> {
        if scopes.is_empty() {
            return Err(Error::Authentication(
                "at least one OAuth2 scope is required".to_string(),
            ));
        }

        {
            let cache = self.access_token_cache.read().await;
            if let Some(token) = cache.get(scopes) {
                if !token.is_expired() {
                    let _timer = TOKEN_ACQUISITION_DURATION
                        .with_label_values(&["true"])
                        .start_timer();
                    debug!("Using cached OAuth2 access token");
                    return Ok(credential(token, scopes));
                }
            }
        }

        let _timer = TOKEN_ACQUISITION_DURATION
            .with_label_values(&["false"])
            .start_timer();

        debug!(scopes = %scopes, "Fetching new OAuth2 access token");
        let token = match &self.auth_mode {
            AuthMode::ServiceAccount(creds) => self.fetch_access_token_via_jwt(creds, scopes).await?,
            AuthMode::MetadataServer { base_url, .. } => {
                self.fetch_access_token_from_metadata(base_url, scopes).await?
            }
        };

        let issued = credential(&token, scopes);
        {
            let mut cache = self.access_token_cache.write().await;
            cache.insert(scopes.clone(), token);
        }

        Ok(issued)
    }

    async fn fetch_access_token_from_metadata(
        &self,
        base_url: &str,
        scopes: &Scopes,
    ) -> Result<AccessToken> {
        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            base_url
        );

        let response = self
            .http_client
            .get(&url)
            .query(&[("scopes", scopes.joined(","))])
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)
            .send()
            .await
            .map_err(|e| {
                Error::Authentication(format!("Failed to fetch access token from metadata: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(Error::Authentication(format!(
                "Metadata server returned status {} for access token",
                response.status()
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            Error::Authentication(format!(
                "Failed to parse token response from metadata: {}",
                e
            ))
        })?;

        Ok(AccessToken::from_response(token_response))
    }

    /// Fetch a new OAuth2 access token via JWT assertion (service account mode)
    async fn fetch_access_token_via_jwt(
        &self,
        credentials: &ServiceAccountCredentials,
        scopes: &Scopes,
    ) -> Result<AccessToken> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::Authentication(format!("System time error: {}", e)))?
            .as_secs();

        let claims = OAuth2Claims {
            iss: credentials.client_email.clone(),
            scope: scopes.joined(" "),
            aud: credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(credentials.private_key_id.clone());

        let encoding_key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| Error::Authentication(format!("Failed to parse private key: {}", e)))?;

        let assertion = encode(&header, &claims, &encoding_key)
            .map_err(|e| Error::Authentication(format!("Failed to encode JWT assertion: {}", e)))?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OAuth2 token endpoint HTTP request failed");
                Error::Authentication(format!("Failed to request access token: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Authentication(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Authentication(format!("Failed to parse token response: {}", e)))?;

        Ok(AccessToken::from_response(token_response))
    }
}

fn credential(token: &AccessToken, scopes: &Scopes) -> Credential {
    Credential {
        token: token.token.clone(),
        scopes: scopes.clone(),
        expires_at: Some(token.expires_at_utc),
    }
}

#[async_trait]
impl TokenProvider for GcpAuth {
    async fn token(&self, scopes: &Scopes) -> Result<Credential> {
        self.access_token(scopes).await
    }
}
