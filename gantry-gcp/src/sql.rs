//! Cloud SQL Admin connection settings

use crate::auth::TokenProvider;
use crate::config::{ApiEndpoint, GcpConfig};
use crate::transport::AuthenticatedTransport;
use crate::Result;
use chrono::{DateTime, Utc};
use gantry_core::wire::{self, Field, Zulu};
use gantry_core::{wire_enum, ResourceIdentity};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::sync::Arc;
use tracing::debug;

wire_enum! {
    pub enum SqlIpAddressType {
        Unspecified = "SQL_IP_ADDRESS_TYPE_UNSPECIFIED",
        Primary = "PRIMARY",
        Outgoing = "OUTGOING",
        Private = "PRIVATE",
        Migrated1stGen = "MIGRATED_1ST_GEN",
    }
}

wire_enum! {
    pub enum SqlBackendType {
        Unspecified = "SQL_BACKEND_TYPE_UNSPECIFIED",
        FirstGen = "FIRST_GEN",
        SecondGen = "SECOND_GEN",
        External = "EXTERNAL",
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslCert {
    #[serde(default)]
    pub kind: String,
    pub cert_serial_number: String,
    /// PEM
    pub cert: String,
    #[serde_as(as = "Zulu")]
    pub create_time: DateTime<Utc>,
    pub common_name: String,
    #[serde_as(as = "Zulu")]
    pub expiration_time: DateTime<Utc>,
    pub sha1_fingerprint: String,
    pub instance: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub self_link: Field<String>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpMapping {
    #[serde(rename = "type")]
    pub address_type: SqlIpAddressType,
    pub ip_address: String,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub time_to_retire: Field<DateTime<Utc>>,
}

/// What a client needs to reach an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectSettings {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub server_ca_cert: SslCert,
    #[serde(default)]
    pub ip_addresses: Vec<IpMapping>,
    pub region: String,
    /// e.g. `POSTGRES_15`; kept open since new versions ship often
    pub database_version: String,
    #[serde(default)]
    pub backend_type: SqlBackendType,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub psc_enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub dns_name: Field<String>,
}

fn default_kind() -> String {
    "sql#connectSettings".to_string()
}

impl ConnectSettings {
    /// First address of the given type
    pub fn ip_address(&self, address_type: SqlIpAddressType) -> Option<&str> {
        self.ip_addresses
            .iter()
            .find(|mapping| mapping.address_type == address_type)
            .map(|mapping| mapping.ip_address.as_str())
    }
}

/// Cloud SQL Admin client for one project
pub struct CloudSqlClient {
    config: GcpConfig,
    transport: AuthenticatedTransport,
}

impl CloudSqlClient {
    pub fn new(config: GcpConfig, provider: Arc<dyn TokenProvider>) -> Result<Self> {
        let transport = AuthenticatedTransport::new(&config, ApiEndpoint::SQL_ADMIN, provider)?;
        Ok(Self { config, transport })
    }

    /// `projects/{project}/instances/{instance_id}`
    pub fn instance_path(&self, instance_id: &str) -> Result<ResourceIdentity> {
        Ok(self.config.project_path()?.child("instances", instance_id)?)
    }

    /// `{project}:{region}:{instance}`, as used by the Cloud SQL proxy
    pub fn connection_name(&self, region: &str, instance_id: &str) -> String {
        format!("{}:{}:{}", self.config.project_id, region, instance_id)
    }

    /// Unix socket directory the Cloud SQL proxy serves an instance on
    pub fn unix_socket_path(&self, region: &str, instance_id: &str) -> String {
        format!("/cloudsql/{}", self.connection_name(region, instance_id))
    }

    /// Connection settings, optionally as of `read_time`
    #[tracing::instrument(name = "cloud_sql.connect_settings", skip(self), fields(instance = %instance))]
    pub async fn connect_settings(
        &self,
        instance: &ResourceIdentity,
        read_time: Option<DateTime<Utc>>,
    ) -> Result<ConnectSettings> {
        instance.ensure_collection("instances")?;
        let query: Vec<(&str, String)> = read_time
            .iter()
            .map(|time| ("readTime", wire::format_timestamp(time)))
            .collect();

        let settings: ConnectSettings = self
            .transport
            .execute(
                Method::GET,
                &format!("{}/connectSettings", instance),
                &query,
                None,
            )
            .await?;
        debug!(
            region = %settings.region,
            addresses = settings.ip_addresses.len(),
            "Connect settings fetched"
        );
        Ok(settings)
    }

    /// Release the connection pool
    pub fn close(self) {
        self.transport.close();
    }
}
