//! GCP configuration loading and validation.

use crate::auth::Scopes;
use crate::{Error, Result};
use gantry_core::ResourceIdentity;
use std::time::Duration;

/// A Google REST API host and version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiEndpoint {
    /// Short service name used in logs and metric labels
    pub service: &'static str,
    pub host: &'static str,
    pub version: &'static str,
    /// Scope requested when the config names none
    pub default_scope: &'static str,
}

impl ApiEndpoint {
    pub const CLOUD_TASKS: ApiEndpoint = ApiEndpoint {
        service: "cloudtasks",
        host: "cloudtasks.googleapis.com",
        version: "v2beta3",
        default_scope: Scopes::CLOUD_TASKS,
    };

    pub const PUBSUB: ApiEndpoint = ApiEndpoint {
        service: "pubsub",
        host: "pubsub.googleapis.com",
        version: "v1",
        default_scope: Scopes::PUBSUB,
    };

    pub const CLOUD_SCHEDULER: ApiEndpoint = ApiEndpoint {
        service: "cloudscheduler",
        host: "cloudscheduler.googleapis.com",
        version: "v1",
        default_scope: Scopes::CLOUD_SCHEDULER,
    };

    pub const SQL_ADMIN: ApiEndpoint = ApiEndpoint {
        service: "sqladmin",
        host: "sqladmin.googleapis.com",
        version: "v1",
        default_scope: Scopes::SQL_ADMIN,
    };

    pub const DRIVE: ApiEndpoint = ApiEndpoint {
        service: "drive",
        host: "www.googleapis.com",
        version: "drive/v3",
        default_scope: Scopes::DRIVE,
    };
}

/// Configuration shared by every service client.
#[derive(Debug, Clone)]
pub struct GcpConfig {
    pub project_id: String,
    pub location_id: String,
    /// Scopes requested for every call; empty means the endpoint default
    pub scopes: Scopes,
    /// Replaces `https://<host>` (emulators, mock servers)
    pub api_root_override: Option<String>,
    /// Applied to the HTTP client; no timeout when unset
    pub request_timeout: Option<Duration>,
}

impl GcpConfig {
    pub fn new(project_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location_id: location_id.into(),
            scopes: Scopes::default(),
            api_root_override: None,
            request_timeout: None,
        }
    }

    pub fn with_scopes(mut self, scopes: Scopes) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_api_root(mut self, root: impl Into<String>) -> Self {
        self.api_root_override = Some(root.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn from_env() -> Result<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .map_err(|_| Error::Config("GCP_PROJECT_ID not set".into()))?;
        let location_id = std::env::var("GCP_LOCATION")
            .map_err(|_| Error::Config("GCP_LOCATION not set".into()))?;

        let scopes = std::env::var("GCP_SCOPES")
            .map(|raw| parse_scopes(&raw))
            .unwrap_or_default();
        let api_root_override = std::env::var("GANTRY_API_ROOT").ok();
        let request_timeout = match std::env::var("GANTRY_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => Some(parse_timeout(&raw)?),
            Err(_) => None,
        };

        let cfg = Self {
            project_id,
            location_id,
            scopes,
            api_root_override,
            request_timeout,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(Error::Config("project_id cannot be empty".into()));
        }
        if self.location_id.trim().is_empty() {
            return Err(Error::Config("location_id cannot be empty".into()));
        }
        if self.project_id.contains('/') || self.location_id.contains('/') {
            return Err(Error::Config(
                "project_id and location_id must not contain '/'".into(),
            ));
        }

        if let Some(root) = &self.api_root_override {
            if !root.starts_with("https://") && !root.starts_with("http://") {
                return Err(Error::Config(
                    "api_root_override must be a valid HTTP(S) URL".into(),
                ));
            }
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(Error::Config("request_timeout must be positive".into()));
        }

        Ok(())
    }

    /// `projects/{project_id}`
    pub fn project_path(&self) -> Result<ResourceIdentity> {
        Ok(ResourceIdentity::project(&self.project_id)?)
    }

    /// `projects/{project_id}/locations/{location_id}`
    pub fn location_path(&self) -> Result<ResourceIdentity> {
        Ok(ResourceIdentity::location(&self.project_id, &self.location_id)?)
    }

    /// Base URL for an endpoint, always ending in `/`
    pub fn base_url(&self, endpoint: &ApiEndpoint) -> String {
        let root = match &self.api_root_override {
            Some(root) => root.trim_end_matches('/').to_string(),
            None => format!("https://{}", endpoint.host),
        };
        format!("{}/{}/", root, endpoint.version)
    }

    /// Scopes to request against `endpoint`
    pub fn scopes_for(&self, endpoint: &ApiEndpoint) -> Scopes {
        if self.scopes.is_empty() {
            Scopes::single(endpoint.default_scope)
        } else {
            self.scopes.clone()
        }
    }
}

fn parse_scopes(raw: &str) -> Scopes {
    Scopes::new(raw.split(|c: char| c == ',' || c.is_whitespace()))
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: f64 = raw.trim().parse().map_err(|_| {
        Error::Config(format!(
            "GANTRY_REQUEST_TIMEOUT_SECS must be a number of seconds, got '{}'",
            raw
        ))
    })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(Error::Config(
            "GANTRY_REQUEST_TIMEOUT_SECS must be positive".into(),
        ));
    }
    Ok(Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_project_id() {
        let config = GcpConfig::new("", "us-central1");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_location() {
        let config = GcpConfig::new("project-123", " ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_invalid_root() {
        let config = GcpConfig::new("project-123", "us-central1").with_api_root("localhost:8085");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config =
            GcpConfig::new("project-123", "us-central1").with_request_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        let config = GcpConfig::new("project-123", "us-central1")
            .with_api_root("http://127.0.0.1:8085")
            .with_request_timeout(Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn base_url_uses_host_or_override() {
        let config = GcpConfig::new("p", "l");
        assert_eq!(
            config.base_url(&ApiEndpoint::CLOUD_TASKS),
            "https://cloudtasks.googleapis.com/v2beta3/"
        );
        assert_eq!(
            config.base_url(&ApiEndpoint::DRIVE),
            "https://www.googleapis.com/drive/v3/"
        );

        let local = config.with_api_root("http://127.0.0.1:9000/");
        assert_eq!(
            local.base_url(&ApiEndpoint::PUBSUB),
            "http://127.0.0.1:9000/v1/"
        );
    }

    #[test]
    fn scopes_fall_back_to_endpoint_default() {
        let config = GcpConfig::new("p", "l");
        assert!(config
            .scopes_for(&ApiEndpoint::PUBSUB)
            .contains(Scopes::PUBSUB));

        let explicit = config.with_scopes(Scopes::single(Scopes::CLOUD_PLATFORM));
        let scopes = explicit.scopes_for(&ApiEndpoint::PUBSUB);
        assert!(scopes.contains(Scopes::CLOUD_PLATFORM));
        assert!(!scopes.contains(Scopes::PUBSUB));
    }

    #[test]
    fn location_path_is_hierarchical() {
        let config = GcpConfig::new("p", "l");
        assert_eq!(
            config.location_path().unwrap().to_string(),
            "projects/p/locations/l"
        );
        assert_eq!(config.project_path().unwrap().to_string(), "projects/p");
    }

    #[test]
    fn parses_scope_lists_and_timeouts() {
        let scopes = parse_scopes("a, b c");
        assert_eq!(scopes.joined(","), "a,b,c");
        assert_eq!(parse_timeout("2.5").unwrap(), Duration::from_millis(2500));
        assert!(parse_timeout("-1").is_err());
        assert!(parse_timeout("soon").is_err());
    }
}
