//! Drive v3 file reads

use crate::auth::TokenProvider;
use crate::config::{ApiEndpoint, GcpConfig};
use crate::transport::AuthenticatedTransport;
use crate::{Error, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use gantry_core::wire::{Field, Zulu};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::serde_as;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveUser {
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub email_address: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub permission_id: Field<String>,
}

/// int64 counters arrive as strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageQuota {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub limit: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub usage: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub usage_in_drive: Field<String>,
}

/// Account information from `GET about?fields=*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    #[serde(default)]
    pub user: DriveUser,
    #[serde(default)]
    pub storage_quota: StorageQuota,
    /// Every other field the API returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub size: Field<String>,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_time: Field<DateTime<Utc>>,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub modified_time: Field<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileMetadata {
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.value().and_then(|size| size.parse().ok())
    }
}

/// File content together with its metadata
#[derive(Debug, Clone)]
pub struct DriveFile {
    pub content: Bytes,
    pub metadata: FileMetadata,
}

pub struct DriveClient {
    transport: AuthenticatedTransport,
}

impl DriveClient {
    pub fn new(config: GcpConfig, provider: Arc<dyn TokenProvider>) -> Result<Self> {
        let transport = AuthenticatedTransport::new(&config, ApiEndpoint::DRIVE, provider)?;
        Ok(Self { transport })
    }

    /// Also serves as a cheap credential check
    pub async fn about(&self) -> Result<About> {
        self.transport
            .execute(Method::GET, "about", &[("fields", "*".to_string())], None)
            .await
    }

    #[tracing::instrument(name = "drive.file_metadata", skip(self))]
    pub async fn file_metadata(&self, file_id: &str) -> Result<FileMetadata> {
        let path = file_path(file_id)?;
        self.transport
            .execute(Method::GET, &path, &[("fields", "*".to_string())], None)
            .await
    }

    /// Raw file bytes (`alt=media`)
    #[tracing::instrument(name = "drive.file_content", skip(self))]
    pub async fn file_content(&self, file_id: &str) -> Result<Bytes> {
        let path = file_path(file_id)?;
        let response = self
            .transport
            .send(Method::GET, &path, &[("alt", "media".to_string())], None)
            .await?
            .into_success(&path)?;
        debug!(bytes = response.body.len(), "File downloaded");
        Ok(response.body)
    }

    /// Content and metadata, fetched concurrently
    pub async fn file(&self, file_id: &str) -> Result<DriveFile> {
        let (content, metadata) =
            tokio::try_join!(self.file_content(file_id), self.file_metadata(file_id))?;
        Ok(DriveFile { content, metadata })
    }

    /// Release the connection pool
    pub fn close(self) {
        self.transport.close();
    }
}

fn file_path(file_id: &str) -> Result<String> {
    if file_id.is_empty() {
        return Err(Error::Config("file id cannot be empty".to_string()));
    }
    Ok(format!("files/{}", urlencoding::encode(file_id)))
}
