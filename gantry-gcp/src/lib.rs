//! # Gantry GCP
//!
//! Authenticated, idempotent provisioning clients for Google Cloud REST APIs:
//! Cloud Tasks, Pub/Sub, Cloud Scheduler, Cloud SQL Admin and Drive.
//!
//! Every service client is a thin layer over three pieces:
//! - [`auth::TokenProvider`] supplies bearer credentials
//! - [`transport::AuthenticatedTransport`] attaches them and performs one round trip
//! - [`resource::ResourceClient`] drives get / create / get-or-create / delete

pub mod auth;
pub mod config;
pub mod drive;
pub mod metrics;
pub mod pubsub;
pub mod resource;
pub mod scheduler;
pub mod sql;
pub mod tasks;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use auth::{Credential, GcpAuth, Scopes, StaticTokenProvider, TokenProvider};
pub use config::{ApiEndpoint, GcpConfig};
pub use drive::DriveClient;
pub use pubsub::PubSubClient;
pub use resource::{Lifecycle, ProvisionState, Provisioned, ResourceClient, ResourceKind};
pub use scheduler::CloudSchedulerClient;
pub use sql::CloudSqlClient;
pub use tasks::CloudTasksClient;
pub use transport::{ApiResponse, AuthenticatedTransport};

use gantry_core::{DecodeError, EncodeError, IdentityError};

/// Result type for GCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which step of an operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Auth,
    Encode,
    Transport,
    Response,
    Decode,
    Config,
    Internal,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            Stage::Auth => "auth",
            Stage::Encode => "encode",
            Stage::Transport => "transport",
            Stage::Response => "response",
            Stage::Decode => "decode",
            Stage::Config => "config",
            Stage::Internal => "internal",
        };
        f.write_str(stage)
    }
}

/// Error types for GCP operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The API rejected the bearer token (`401`)
    #[error("Credentials rejected for {resource}: {body}")]
    Unauthorized { resource: String, body: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("GCP API returned {status}: {body}")]
    ResourceClient { status: u16, body: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid resource identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    #[error("Invalid lifecycle transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ProvisionState,
        to: ProvisionState,
    },
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::Authentication(_) => Stage::Auth,
            Error::NotFound { .. } | Error::Unauthorized { .. } | Error::ResourceClient { .. } => {
                Stage::Response
            }
            Error::Decode(_) => Stage::Decode,
            Error::Encode(_) => Stage::Encode,
            Error::Transport(_) => Stage::Transport,
            Error::Config(_) | Error::InvalidIdentity(_) => Stage::Config,
            Error::InvalidTransition { .. } => Stage::Internal,
        }
    }

    /// HTTP status carried by the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::NotFound { .. } => Some(404),
            Error::Unauthorized { .. } => Some(401),
            Error::ResourceClient { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
