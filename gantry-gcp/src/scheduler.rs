//! Cloud Scheduler client for cron jobs
//!
//! Jobs target either an App Engine service or an arbitrary HTTP endpoint.
//! Payloads are JSON, base64-encoded into the target body.

use crate::auth::TokenProvider;
use crate::config::{ApiEndpoint, GcpConfig};
use crate::resource::{CreateStyle, Provisioned, ResourceClient, ResourceKind};
use crate::transport::AuthenticatedTransport;
use crate::types::{HttpMethod, OidcToken, RpcStatus};
use crate::Result;
use chrono::{DateTime, Utc};
use gantry_core::wire::{self, Base64, Field, Seconds, Zulu};
use gantry_core::{wire_enum, EncodeError, ResourceIdentity};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Every 10 days at 08:00
pub const DEFAULT_SCHEDULE: &str = "0 8 */10 * *";

wire_enum! {
    /// State of a job
    pub enum JobState {
        Unspecified = "STATE_UNSPECIFIED",
        Enabled = "ENABLED",
        Paused = "PAUSED",
        Disabled = "DISABLED",
        UpdateFailed = "UPDATE_FAILED",
    }
}

/// Retry policy for failed job attempts
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub retry_count: i32,
    #[serde_as(as = "Seconds")]
    pub max_retry_duration: Duration,
    #[serde_as(as = "Seconds")]
    pub min_backoff_duration: Duration,
    #[serde_as(as = "Seconds")]
    pub max_backoff_duration: Duration,
    pub max_doublings: i32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_count: 0,
            max_retry_duration: Duration::from_secs(15),
            min_backoff_duration: Duration::from_millis(3500),
            max_backoff_duration: Duration::from_millis(3500),
            max_doublings: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEngineRouting {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub service: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub version: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub instance: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub host: Field<String>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEngineHttpTarget {
    pub http_method: HttpMethod,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub app_engine_routing: Field<AppEngineRouting>,
    pub relative_uri: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde_as(as = "Field<Base64>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub body: Field<Vec<u8>>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTarget {
    pub uri: String,
    pub http_method: HttpMethod,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde_as(as = "Field<Base64>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub body: Field<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub oidc_token: Field<OidcToken>,
}

/// Desired state of a job
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// `projects/{project}/locations/{location}/jobs/{job}`
    pub name: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub time_zone: Field<String>,
    #[serde(default)]
    pub retry_config: RetryConfig,
    #[serde_as(as = "Field<Seconds>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub attempt_deadline: Field<Duration>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub app_engine_http_target: Field<AppEngineHttpTarget>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub http_target: Field<HttpTarget>,
}

fn default_schedule() -> String {
    DEFAULT_SCHEDULE.to_string()
}

fn json_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Accept".to_string(), "application/json".to_string());
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers
}

impl Job {
    fn bare(name: &ResourceIdentity) -> Self {
        Self {
            name: name.to_string(),
            description: Field::Unset,
            schedule: default_schedule(),
            time_zone: Field::Unset,
            retry_config: RetryConfig::default(),
            attempt_deadline: Field::Unset,
            app_engine_http_target: Field::Unset,
            http_target: Field::Unset,
        }
    }

    /// Job calling an App Engine handler with `payload` as its JSON body
    pub fn app_engine<T: Serialize + ?Sized>(
        name: &ResourceIdentity,
        relative_uri: impl Into<String>,
        http_method: HttpMethod,
        payload: &T,
    ) -> std::result::Result<Self, EncodeError> {
        let mut job = Self::bare(name);
        job.app_engine_http_target = AppEngineHttpTarget {
            http_method,
            app_engine_routing: Field::Unset,
            relative_uri: relative_uri.into(),
            headers: json_headers(),
            body: wire::encode_to_vec(payload)?.into(),
        }
        .into();
        Ok(job)
    }

    /// Job calling `uri`, optionally authenticated with an OIDC token
    pub fn http<T: Serialize + ?Sized>(
        name: &ResourceIdentity,
        uri: impl Into<String>,
        http_method: HttpMethod,
        payload: &T,
        oidc_token: Option<OidcToken>,
    ) -> std::result::Result<Self, EncodeError> {
        let mut job = Self::bare(name);
        job.http_target = HttpTarget {
            uri: uri.into(),
            http_method,
            headers: json_headers(),
            body: wire::encode_to_vec(payload)?.into(),
            oidc_token: oidc_token.map(Field::Value).unwrap_or_default(),
        }
        .into();
        Ok(job)
    }

    /// Cron expression, interpreted in `time_zone` (e.g. "America/New_York")
    pub fn with_schedule(mut self, cron: impl Into<String>, time_zone: impl Into<String>) -> Self {
        self.schedule = cron.into();
        self.time_zone = Field::Value(time_zone.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Field::Value(description.into());
        self
    }
}

/// Observed state of a job
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(flatten)]
    pub spec: Job,
    #[serde(default)]
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub status: Field<RpcStatus>,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub user_update_time: Field<DateTime<Utc>>,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub schedule_time: Field<DateTime<Utc>>,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub last_attempt_time: Field<DateTime<Utc>>,
}

pub struct JobKind;

impl ResourceKind for JobKind {
    const KIND: &'static str = "job";
    const COLLECTION: &'static str = "jobs";
    const CREATE_STYLE: CreateStyle = CreateStyle::PostToCollection;
    type Spec = Job;
    type Status = JobStatus;
}

/// Cloud Scheduler client for one project/location
pub struct CloudSchedulerClient {
    config: GcpConfig,
    jobs: ResourceClient<JobKind>,
}

impl CloudSchedulerClient {
    pub fn new(config: GcpConfig, provider: Arc<dyn TokenProvider>) -> Result<Self> {
        let transport =
            AuthenticatedTransport::new(&config, ApiEndpoint::CLOUD_SCHEDULER, provider)?;
        Ok(Self {
            config,
            jobs: ResourceClient::new(Arc::new(transport)),
        })
    }

    pub fn jobs(&self) -> &ResourceClient<JobKind> {
        &self.jobs
    }

    /// Release the connection pool; `false` if a cloned
    /// [`jobs`](Self::jobs) handle keeps it alive
    pub fn close(self) -> bool {
        self.jobs.close()
    }

    /// `projects/{project}/locations/{location}/jobs/{job_id}`
    ///
    /// Job ids must match `[a-zA-Z0-9_-]{1,500}`.
    pub fn job_path(&self, job_id: &str) -> Result<ResourceIdentity> {
        Ok(self.config.location_path()?.child(JobKind::COLLECTION, job_id)?)
    }

    pub async fn create_job(&self, job: &Job) -> Result<JobStatus> {
        let id = ResourceIdentity::parse(&job.name)?;
        self.jobs.create(&id, job).await
    }

    pub async fn get_job(&self, job: &ResourceIdentity) -> Result<JobStatus> {
        self.jobs.get(job).await
    }

    /// `None` when the job does not exist
    pub async fn lookup_job(&self, job: &ResourceIdentity) -> Result<Option<JobStatus>> {
        self.jobs.lookup(job).await
    }

    pub async fn get_or_create_job(&self, job: &Job) -> Result<Provisioned<JobStatus>> {
        let id = ResourceIdentity::parse(&job.name)?;
        self.jobs.get_or_create(&id, job).await
    }

    /// PATCH every set field of `job`; the mask names them
    pub async fn update_job(&self, job: &Job) -> Result<JobStatus> {
        let id = ResourceIdentity::parse(&job.name)?;
        self.jobs.update(&id, job).await
    }

    /// Create the job, or bring an existing one in line with `job`
    #[tracing::instrument(name = "cloud_scheduler.create_or_update_job", skip_all, fields(job = %job.name))]
    pub async fn create_or_update_job(&self, job: &Job) -> Result<JobStatus> {
        let id = ResourceIdentity::parse(&job.name)?;
        match self.jobs.lookup(&id).await? {
            Some(_) => self.jobs.update(&id, job).await,
            None => self.jobs.create(&id, job).await,
        }
    }

    pub async fn delete_job(&self, job: &ResourceIdentity) -> Result<bool> {
        self.jobs.delete(job).await
    }

    pub async fn pause_job(&self, job: &ResourceIdentity) -> Result<JobStatus> {
        let status: JobStatus = self.jobs.action(job, "pause", &serde_json::json!({})).await?;
        info!(job = %job, state = %status.state, "Cloud Scheduler job paused");
        Ok(status)
    }

    pub async fn resume_job(&self, job: &ResourceIdentity) -> Result<JobStatus> {
        let status: JobStatus = self.jobs.action(job, "resume", &serde_json::json!({})).await?;
        info!(job = %job, state = %status.state, "Cloud Scheduler job resumed");
        Ok(status)
    }

    /// Force one run now, outside the schedule
    pub async fn run_job(&self, job: &ResourceIdentity) -> Result<JobStatus> {
        self.jobs.action(job, "run", &serde_json::json!({})).await
    }
}
