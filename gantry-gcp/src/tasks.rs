//! Cloud Tasks queues and tasks

use crate::auth::TokenProvider;
use crate::config::{ApiEndpoint, GcpConfig};
use crate::resource::{CreateStyle, Provisioned, ResourceClient, ResourceKind};
use crate::transport::AuthenticatedTransport;
use crate::types::{HttpMethod, OidcToken, RpcStatus};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use gantry_core::wire::{self, Base64, Field, Seconds, Zulu};
use gantry_core::{wire_enum, EncodeError, ResourceIdentity};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Tasks older than this are deleted: 10 days
pub const DEFAULT_TASK_TTL: Duration = Duration::from_secs(864_000);
/// How long a task name stays reserved after deletion: 1 hour
pub const DEFAULT_TOMBSTONE_TTL: Duration = Duration::from_secs(3_600);

wire_enum! {
    pub enum QueueType {
        Unspecified = "TYPE_UNSPECIFIED",
        Pull = "PULL",
        Push = "PUSH",
    }
}

wire_enum! {
    /// State of a queue
    pub enum QueueState {
        Unspecified = "STATE_UNSPECIFIED",
        Running = "RUNNING",
        Paused = "PAUSED",
        Disabled = "DISABLED",
    }
}

wire_enum! {
    pub enum UriOverrideEnforceMode {
        Unspecified = "URI_OVERRIDE_ENFORCE_MODE_UNSPECIFIED",
        IfNotExists = "IF_NOT_EXISTS",
        Always = "ALWAYS",
    }
}

wire_enum! {
    pub enum Scheme {
        Unspecified = "SCHEME_UNSPECIFIED",
        Http = "HTTP",
        Https = "HTTPS",
    }
}

wire_enum! {
    /// How much of a task the API returns
    pub enum TaskView {
        Unspecified = "VIEW_UNSPECIFIED",
        Basic = "BASIC",
        Full = "FULL",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RateLimits {
    pub max_dispatches_per_second: f64,
    pub max_burst_size: i32,
    pub max_concurrent_dispatches: i32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            max_dispatches_per_second: 500.0,
            max_burst_size: 500,
            max_concurrent_dispatches: 1000,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub max_attempts: i32,
    #[serde_as(as = "Seconds")]
    pub max_retry_duration: Duration,
    #[serde_as(as = "Seconds")]
    pub min_backoff: Duration,
    #[serde_as(as = "Seconds")]
    pub max_backoff: Duration,
    pub max_doublings: i32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            max_retry_duration: Duration::ZERO,
            min_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(3600),
            max_doublings: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StackdriverLoggingConfig {
    pub sampling_ratio: f64,
}

impl Default for StackdriverLoggingConfig {
    fn default() -> Self {
        Self {
            sampling_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathOverride {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOverride {
    #[serde(default)]
    pub query_params: String,
}

/// Rewrites parts of every task URL dispatched from the queue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UriOverride {
    #[serde(default)]
    pub scheme: Scheme,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub host: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub port: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub path_override: Field<PathOverride>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub query_override: Field<QueryOverride>,
    #[serde(default)]
    pub uri_override_enforce_mode: UriOverrideEnforceMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderOverride {
    pub header: Header,
}

/// Queue-level HTTP target applied to every task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTarget {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub uri_override: Field<UriOverride>,
    #[serde(default)]
    pub http_method: HttpMethod,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_overrides: Vec<HeaderOverride>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub oidc_token: Field<OidcToken>,
}

/// Desired state of a push queue
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    /// `projects/{project}/locations/{location}/queues/{queue}`
    pub name: String,
    #[serde(default)]
    pub rate_limits: RateLimits,
    #[serde(default)]
    pub retry_config: RetryConfig,
    #[serde_as(as = "Seconds")]
    #[serde(default = "default_task_ttl")]
    pub task_ttl: Duration,
    #[serde_as(as = "Seconds")]
    #[serde(default = "default_tombstone_ttl")]
    pub tombstone_ttl: Duration,
    #[serde(default)]
    pub stackdriver_logging_config: StackdriverLoggingConfig,
    #[serde(rename = "type", default)]
    pub queue_type: QueueType,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub http_target: Field<HttpTarget>,
}

fn default_task_ttl() -> Duration {
    DEFAULT_TASK_TTL
}

fn default_tombstone_ttl() -> Duration {
    DEFAULT_TOMBSTONE_TTL
}

impl Queue {
    /// Push queue with the service defaults
    pub fn new(name: &ResourceIdentity) -> Self {
        Self {
            name: name.to_string(),
            rate_limits: RateLimits::default(),
            retry_config: RetryConfig::default(),
            task_ttl: DEFAULT_TASK_TTL,
            tombstone_ttl: DEFAULT_TOMBSTONE_TTL,
            stackdriver_logging_config: StackdriverLoggingConfig::default(),
            queue_type: QueueType::Push,
            http_target: Field::Unset,
        }
    }

    /// Route every task through an HTTP target authenticated as `service_account_email`
    pub fn with_http_target(mut self, method: HttpMethod, service_account_email: &str) -> Self {
        self.http_target = HttpTarget {
            uri_override: Field::Unset,
            http_method: method,
            header_overrides: vec![],
            oidc_token: OidcToken {
                service_account_email: service_account_email.to_string(),
                audience: String::new(),
            }
            .into(),
        }
        .into();
        self
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    #[serde(default)]
    pub tasks_count: String,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub oldest_estimated_arrival_time: Field<DateTime<Utc>>,
    #[serde(default)]
    pub executed_last_minute_count: String,
    #[serde(default)]
    pub concurrent_dispatches_count: String,
    #[serde(default)]
    pub effective_execution_rate: f64,
}

/// Observed state of a queue
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    #[serde(flatten)]
    pub spec: Queue,
    pub state: QueueState,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub purge_time: Field<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub stats: Field<QueueStats>,
}

pub struct QueueKind;

impl ResourceKind for QueueKind {
    const KIND: &'static str = "queue";
    const COLLECTION: &'static str = "queues";
    const CREATE_STYLE: CreateStyle = CreateStyle::PostToCollection;
    type Spec = Queue;
    type Status = QueueStatus;
}

/// HTTP request a task dispatches
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    pub url: String,
    #[serde(default)]
    pub http_method: HttpMethod,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde_as(as = "Field<Base64>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub body: Field<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub oidc_token: Field<OidcToken>,
}

impl HttpRequest {
    /// `POST` of a JSON payload
    pub fn post_json<T: Serialize + ?Sized>(
        url: impl Into<String>,
        payload: &T,
    ) -> std::result::Result<Self, EncodeError> {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Ok(Self {
            url: url.into(),
            http_method: HttpMethod::Post,
            headers,
            body: wire::encode_to_vec(payload)?.into(),
            oidc_token: Field::Unset,
        })
    }

    pub fn with_oidc_token(mut self, token: OidcToken) -> Self {
        self.oidc_token = token.into();
        self
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub schedule_time: Field<DateTime<Utc>>,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub dispatch_time: Field<DateTime<Utc>>,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub response_time: Field<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub response_status: Field<RpcStatus>,
}

/// A task; server-assigned fields stay unset on create
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub name: Field<String>,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub schedule_time: Field<DateTime<Utc>>,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub create_time: Field<DateTime<Utc>>,
    #[serde_as(as = "Field<Seconds>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub dispatch_deadline: Field<Duration>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub dispatch_count: Field<i32>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub response_count: Field<i32>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub first_attempt: Field<Attempt>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub last_attempt: Field<Attempt>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub view: Field<TaskView>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub http_request: Field<HttpRequest>,
}

impl Task {
    pub fn http(request: HttpRequest) -> Self {
        Self {
            name: Field::Unset,
            schedule_time: Field::Unset,
            create_time: Field::Unset,
            dispatch_deadline: Field::Unset,
            dispatch_count: Field::Unset,
            response_count: Field::Unset,
            first_attempt: Field::Unset,
            last_attempt: Field::Unset,
            view: Field::Unset,
            http_request: request.into(),
        }
    }

    /// Pin the task name, making creation idempotent on the server
    pub fn named(mut self, name: &ResourceIdentity) -> Self {
        self.name = name.to_string().into();
        self
    }

    pub fn scheduled_at(mut self, time: DateTime<Utc>) -> Self {
        self.schedule_time = time.into();
        self
    }
}

/// Body of `POST {queue}/tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub task: Task,
    #[serde(default)]
    pub response_view: TaskView,
}

impl CreateTaskRequest {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            response_view: TaskView::Unspecified,
        }
    }
}

/// Client for Cloud Tasks queues in one project/location
pub struct CloudTasksClient {
    config: GcpConfig,
    queues: ResourceClient<QueueKind>,
}

impl CloudTasksClient {
    pub fn new(config: GcpConfig, provider: Arc<dyn TokenProvider>) -> Result<Self> {
        let transport = AuthenticatedTransport::new(&config, ApiEndpoint::CLOUD_TASKS, provider)?;
        Ok(Self {
            config,
            queues: ResourceClient::new(Arc::new(transport)),
        })
    }

    pub fn queues(&self) -> &ResourceClient<QueueKind> {
        &self.queues
    }

    /// Release the connection pool; `false` if a cloned
    /// [`queues`](Self::queues) handle keeps it alive
    pub fn close(self) -> bool {
        self.queues.close()
    }

    /// `projects/{project}/locations/{location}/queues/{queue_id}`
    pub fn queue_path(&self, queue_id: &str) -> Result<ResourceIdentity> {
        Ok(self.config.location_path()?.child("queues", queue_id)?)
    }

    pub async fn get_queue(&self, queue: &ResourceIdentity) -> Result<QueueStatus> {
        self.queues.get(queue).await
    }

    pub async fn create_queue(&self, queue: &Queue) -> Result<QueueStatus> {
        let id = ResourceIdentity::parse(&queue.name)?;
        self.queues.create(&id, queue).await
    }

    /// Get the queue, creating it with [`Queue::new`] defaults when absent
    pub async fn get_or_create_queue(
        &self,
        queue: &ResourceIdentity,
    ) -> Result<Provisioned<QueueStatus>> {
        self.queues.get_or_create(queue, &Queue::new(queue)).await
    }

    pub async fn delete_queue(&self, queue: &ResourceIdentity) -> Result<bool> {
        self.queues.delete(queue).await
    }

    pub async fn pause_queue(&self, queue: &ResourceIdentity) -> Result<QueueStatus> {
        self.queues.action(queue, "pause", &serde_json::json!({})).await
    }

    pub async fn resume_queue(&self, queue: &ResourceIdentity) -> Result<QueueStatus> {
        self.queues.action(queue, "resume", &serde_json::json!({})).await
    }

    /// Delete every task in the queue
    pub async fn purge_queue(&self, queue: &ResourceIdentity) -> Result<QueueStatus> {
        self.queues.action(queue, "purge", &serde_json::json!({})).await
    }

    /// Enqueue a task
    #[tracing::instrument(name = "cloud_tasks.create_task", skip(self, request), fields(queue = %queue))]
    pub async fn create_task(
        &self,
        queue: &ResourceIdentity,
        request: &CreateTaskRequest,
    ) -> Result<Task> {
        queue.ensure_collection(QueueKind::COLLECTION)?;
        if request.task.http_request.is_unset() {
            return Err(Error::Config("task has no http_request".to_string()));
        }

        let body = wire::encode(request)?;
        let task: Task = self
            .queues
            .transport()
            .execute(reqwest::Method::POST, &format!("{}/tasks", queue), &[], Some(&body))
            .await?;

        info!(
            task = task.name.value().map(String::as_str).unwrap_or_default(),
            "Task created"
        );
        Ok(task)
    }
}
