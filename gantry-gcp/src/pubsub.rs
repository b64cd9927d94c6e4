//! Pub/Sub topics, schemas, subscriptions and messages

use crate::auth::TokenProvider;
use crate::config::{ApiEndpoint, GcpConfig};
use crate::resource::{CreateStyle, Provisioned, ResourceClient, ResourceKind};
use crate::transport::AuthenticatedTransport;
use crate::types::{Empty, OidcToken};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use gantry_core::wire::{self, Base64, Field, Seconds, Zulu};
use gantry_core::{wire_enum, DecodeError, EncodeError, ResourceIdentity};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

wire_enum! {
    pub enum Encoding {
        Unspecified = "ENCODING_UNSPECIFIED",
        Json = "JSON",
        Binary = "BINARY",
    }
}

wire_enum! {
    pub enum SchemaType {
        Unspecified = "TYPE_UNSPECIFIED",
        ProtocolBuffer = "PROTOCOL_BUFFER",
        Avro = "AVRO",
    }
}

wire_enum! {
    /// How much of a schema `get` returns
    pub enum SchemaView {
        Unspecified = "SCHEMA_VIEW_UNSPECIFIED",
        Basic = "BASIC",
        Full = "FULL",
    }
}

wire_enum! {
    pub enum SubscriptionState {
        Unspecified = "STATE_UNSPECIFIED",
        Active = "ACTIVE",
        ResourceError = "RESOURCE_ERROR",
    }
}

wire_enum! {
    /// State of a BigQuery or Cloud Storage export
    pub enum ExportState {
        Unspecified = "STATE_UNSPECIFIED",
        Active = "ACTIVE",
        PermissionDenied = "PERMISSION_DENIED",
        NotFound = "NOT_FOUND",
        SchemaMismatch = "SCHEMA_MISMATCH",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStoragePolicy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_persistence_regions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSettings {
    /// `projects/{project}/schemas/{schema}`
    pub schema: String,
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub first_revision_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub last_revision_id: Field<String>,
}

/// A topic; also what the service returns for one
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// `projects/{project}/topics/{topic}`
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub message_storage_policy: Field<MessageStoragePolicy>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub kms_key_name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub schema_settings: Field<SchemaSettings>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub satisfies_pzs: Field<bool>,
    #[serde_as(as = "Field<Seconds>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub message_retention_duration: Field<Duration>,
}

impl Topic {
    pub fn new(name: &ResourceIdentity) -> Self {
        Self {
            name: name.to_string(),
            labels: BTreeMap::new(),
            message_storage_policy: Field::Unset,
            kms_key_name: Field::Unset,
            schema_settings: Field::Unset,
            satisfies_pzs: Field::Unset,
            message_retention_duration: Field::Unset,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_schema(mut self, schema: &ResourceIdentity, encoding: Encoding) -> Self {
        self.schema_settings = SchemaSettings {
            schema: schema.to_string(),
            encoding,
            first_revision_id: Field::Unset,
            last_revision_id: Field::Unset,
        }
        .into();
        self
    }
}

pub struct TopicKind;

impl ResourceKind for TopicKind {
    const KIND: &'static str = "topic";
    const COLLECTION: &'static str = "topics";
    const CREATE_STYLE: CreateStyle = CreateStyle::PutToName;
    const CREATE_EXCLUDE: &'static [&'static str] = &["name"];
    type Spec = Topic;
    type Status = Topic;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// `projects/{project}/schemas/{schema}`
    pub name: String,
    #[serde(rename = "type", default = "default_schema_type")]
    pub schema_type: SchemaType,
    pub definition: String,
}

fn default_schema_type() -> SchemaType {
    SchemaType::Avro
}

impl Schema {
    /// Avro schema with the given definition
    pub fn avro(name: &ResourceIdentity, definition: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            schema_type: SchemaType::Avro,
            definition: definition.into(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaStatus {
    #[serde(flatten)]
    pub spec: Schema,
    #[serde(default)]
    pub revision_id: String,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub revision_create_time: Field<DateTime<Utc>>,
}

pub struct SchemaKind;

impl ResourceKind for SchemaKind {
    const KIND: &'static str = "schema";
    const COLLECTION: &'static str = "schemas";
    const CREATE_STYLE: CreateStyle = CreateStyle::PostWithIdParam("schemaId");
    type Spec = Schema;
    type Status = SchemaStatus;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoWrapper {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub write_metadata: Field<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubsubWrapper {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushConfig {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub push_endpoint: Field<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub oidc_token: Field<OidcToken>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub pubsub_wrapper: Field<PubsubWrapper>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub no_wrapper: Field<NoWrapper>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BigQueryConfig {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub table: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub use_topic_schema: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub write_metadata: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub drop_unknown_fields: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub state: Field<ExportState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvroConfig {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub write_metadata: Field<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextConfig {}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudStorageConfig {
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub filename_prefix: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub filename_suffix: Field<String>,
    #[serde_as(as = "Field<Seconds>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub max_duration: Field<Duration>,
    /// int64, string on the wire
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub max_bytes: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub state: Field<ExportState>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub text_config: Field<TextConfig>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub avro_config: Field<AvroConfig>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationPolicy {
    /// Unset means the subscription never expires
    #[serde_as(as = "Field<Seconds>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ttl: Field<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterPolicy {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub dead_letter_topic: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub max_delivery_attempts: Field<i32>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    #[serde_as(as = "Field<Seconds>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub minimum_backoff: Field<Duration>,
    #[serde_as(as = "Field<Seconds>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub maximum_backoff: Field<Duration>,
}

/// A subscription; at most one of the push, BigQuery and Cloud Storage
/// configs is set
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// `projects/{project}/subscriptions/{subscription}`
    pub name: String,
    /// `projects/{project}/topics/{topic}`
    pub topic: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub push_config: Field<PushConfig>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub bigquery_config: Field<BigQueryConfig>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub cloud_storage_config: Field<CloudStorageConfig>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ack_deadline_seconds: Field<i32>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub retain_acked_messages: Field<bool>,
    #[serde_as(as = "Field<Seconds>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub message_retention_duration: Field<Duration>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enable_message_ordering: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub expiration_policy: Field<ExpirationPolicy>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub filter: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub dead_letter_policy: Field<DeadLetterPolicy>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub retry_policy: Field<RetryPolicy>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub detached: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enable_exactly_once_delivery: Field<bool>,
}

impl Subscription {
    /// Pull subscription on `topic`
    pub fn pull(name: &ResourceIdentity, topic: &ResourceIdentity) -> Self {
        Self {
            name: name.to_string(),
            topic: topic.to_string(),
            push_config: Field::Unset,
            bigquery_config: Field::Unset,
            cloud_storage_config: Field::Unset,
            ack_deadline_seconds: Field::Unset,
            retain_acked_messages: Field::Unset,
            message_retention_duration: Field::Unset,
            labels: BTreeMap::new(),
            enable_message_ordering: Field::Unset,
            expiration_policy: Field::Unset,
            filter: Field::Unset,
            dead_letter_policy: Field::Unset,
            retry_policy: Field::Unset,
            detached: Field::Unset,
            enable_exactly_once_delivery: Field::Unset,
        }
    }

    /// Push subscription delivering to `endpoint`
    pub fn push(
        name: &ResourceIdentity,
        topic: &ResourceIdentity,
        endpoint: impl Into<String>,
        oidc_token: Option<OidcToken>,
    ) -> Self {
        let mut subscription = Self::pull(name, topic);
        subscription.push_config = PushConfig {
            push_endpoint: Field::Value(endpoint.into()),
            oidc_token: oidc_token.map(Field::Value).unwrap_or_default(),
            ..PushConfig::default()
        }
        .into();
        subscription
    }

    pub fn with_ack_deadline(mut self, seconds: i32) -> Self {
        self.ack_deadline_seconds = seconds.into();
        self
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    #[serde(flatten)]
    pub spec: Subscription,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub state: Field<SubscriptionState>,
    #[serde_as(as = "Field<Seconds>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub topic_message_retention_duration: Field<Duration>,
}

pub struct SubscriptionKind;

impl ResourceKind for SubscriptionKind {
    const KIND: &'static str = "subscription";
    const COLLECTION: &'static str = "subscriptions";
    const CREATE_STYLE: CreateStyle = CreateStyle::PutToName;
    const CREATE_EXCLUDE: &'static [&'static str] = &["name"];
    type Spec = Subscription;
    type Status = SubscriptionStatus;
}

/// A message; `data` is base64 on the wire
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    #[serde_as(as = "Field<Base64>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub data: Field<Vec<u8>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub message_id: Field<String>,
    #[serde_as(as = "Field<Zulu>")]
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub publish_time: Field<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ordering_key: Field<String>,
}

impl PubsubMessage {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Field::Value(data.into()),
            ..Self::default()
        }
    }

    /// Message whose data is the JSON encoding of `payload`
    pub fn json<T: Serialize + ?Sized>(payload: &T) -> std::result::Result<Self, EncodeError> {
        Ok(Self::new(wire::encode_to_vec(payload)?))
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_ordering_key(mut self, key: impl Into<String>) -> Self {
        self.ordering_key = Field::Value(key.into());
        self
    }

    /// Decode `data` as JSON
    pub fn data_as<T: DeserializeOwned>(&self) -> std::result::Result<T, DecodeError> {
        wire::decode(self.data.value().map(Vec::as_slice).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub messages: Vec<PubsubMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    #[serde(default)]
    pub message_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub max_messages: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedMessage {
    pub ack_id: String,
    pub message: PubsubMessage,
    #[serde(default)]
    pub delivery_attempt: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    #[serde(default)]
    pub received_messages: Vec<ReceivedMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeRequest {
    pub ack_ids: Vec<String>,
}

/// Client for one project's Pub/Sub resources
pub struct PubSubClient {
    config: GcpConfig,
    topics: ResourceClient<TopicKind>,
    schemas: ResourceClient<SchemaKind>,
    subscriptions: ResourceClient<SubscriptionKind>,
}

impl PubSubClient {
    pub fn new(config: GcpConfig, provider: Arc<dyn TokenProvider>) -> Result<Self> {
        let transport = Arc::new(AuthenticatedTransport::new(
            &config,
            ApiEndpoint::PUBSUB,
            provider,
        )?);
        Ok(Self {
            config,
            topics: ResourceClient::new(Arc::clone(&transport)),
            schemas: ResourceClient::new(Arc::clone(&transport)),
            subscriptions: ResourceClient::new(transport),
        })
    }

    pub fn topics(&self) -> &ResourceClient<TopicKind> {
        &self.topics
    }

    pub fn schemas(&self) -> &ResourceClient<SchemaKind> {
        &self.schemas
    }

    pub fn subscriptions(&self) -> &ResourceClient<SubscriptionKind> {
        &self.subscriptions
    }

    /// Release the connection pool shared by topics, schemas and
    /// subscriptions; `false` if a cloned handle keeps it alive
    pub fn close(self) -> bool {
        let Self {
            topics,
            schemas,
            subscriptions,
            ..
        } = self;
        drop(topics);
        drop(schemas);
        subscriptions.close()
    }

    /// `projects/{project}/topics/{topic_id}`
    pub fn topic_path(&self, topic_id: &str) -> Result<ResourceIdentity> {
        Ok(self.config.project_path()?.child(TopicKind::COLLECTION, topic_id)?)
    }

    pub fn schema_path(&self, schema_id: &str) -> Result<ResourceIdentity> {
        Ok(self.config.project_path()?.child(SchemaKind::COLLECTION, schema_id)?)
    }

    pub fn subscription_path(&self, subscription_id: &str) -> Result<ResourceIdentity> {
        Ok(self
            .config
            .project_path()?
            .child(SubscriptionKind::COLLECTION, subscription_id)?)
    }

    pub async fn get_topic(&self, topic: &ResourceIdentity) -> Result<Topic> {
        self.topics.get(topic).await
    }

    /// `PUT` the topic; `name` and unset keys stay out of the body
    pub async fn create_topic(&self, topic: &Topic) -> Result<Topic> {
        let id = ResourceIdentity::parse(&topic.name)?;
        self.topics.create(&id, topic).await
    }

    pub async fn get_or_create_topic(&self, topic: &Topic) -> Result<Provisioned<Topic>> {
        let id = ResourceIdentity::parse(&topic.name)?;
        self.topics.get_or_create(&id, topic).await
    }

    pub async fn delete_topic(&self, topic: &ResourceIdentity) -> Result<bool> {
        self.topics.delete(topic).await
    }

    pub async fn create_schema(&self, schema: &Schema) -> Result<SchemaStatus> {
        let id = ResourceIdentity::parse(&schema.name)?;
        self.schemas.create(&id, schema).await
    }

    pub async fn get_schema(
        &self,
        schema: &ResourceIdentity,
        view: SchemaView,
    ) -> Result<SchemaStatus> {
        self.schemas
            .get_with(schema, &[("view", view.to_string())])
            .await
    }

    pub async fn get_or_create_schema(&self, schema: &Schema) -> Result<Provisioned<SchemaStatus>> {
        let id = ResourceIdentity::parse(&schema.name)?;
        self.schemas.get_or_create(&id, schema).await
    }

    pub async fn delete_schema(&self, schema: &ResourceIdentity) -> Result<bool> {
        self.schemas.delete(schema).await
    }

    pub async fn get_subscription(
        &self,
        subscription: &ResourceIdentity,
    ) -> Result<SubscriptionStatus> {
        self.subscriptions.get(subscription).await
    }

    pub async fn create_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<SubscriptionStatus> {
        let id = ResourceIdentity::parse(&subscription.name)?;
        self.subscriptions.create(&id, subscription).await
    }

    pub async fn get_or_create_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<Provisioned<SubscriptionStatus>> {
        let id = ResourceIdentity::parse(&subscription.name)?;
        self.subscriptions.get_or_create(&id, subscription).await
    }

    pub async fn delete_subscription(&self, subscription: &ResourceIdentity) -> Result<bool> {
        self.subscriptions.delete(subscription).await
    }

    /// Publish a batch of messages to a topic
    #[tracing::instrument(name = "pubsub.publish", skip(self, messages), fields(topic = %topic, count = messages.len()))]
    pub async fn publish(
        &self,
        topic: &ResourceIdentity,
        messages: Vec<PubsubMessage>,
    ) -> Result<PublishResponse> {
        if messages.is_empty() {
            return Err(Error::Config("publish needs at least one message".to_string()));
        }
        let response: PublishResponse = self
            .topics
            .action(topic, "publish", &PublishRequest { messages })
            .await?;
        info!(message_ids = ?response.message_ids, "Messages published");
        Ok(response)
    }

    /// Publish one message whose data is `payload` as JSON
    pub async fn publish_json<T: Serialize + ?Sized>(
        &self,
        topic: &ResourceIdentity,
        payload: &T,
    ) -> Result<PublishResponse> {
        self.publish(topic, vec![PubsubMessage::json(payload)?]).await
    }

    #[tracing::instrument(name = "pubsub.pull", skip(self), fields(subscription = %subscription))]
    pub async fn pull(
        &self,
        subscription: &ResourceIdentity,
        max_messages: i32,
    ) -> Result<Vec<ReceivedMessage>> {
        if max_messages <= 0 {
            return Err(Error::Config(format!(
                "max_messages must be positive, got {}",
                max_messages
            )));
        }
        let response: PullResponse = self
            .subscriptions
            .action(subscription, "pull", &PullRequest { max_messages })
            .await?;
        debug!(received = response.received_messages.len(), "Pulled messages");
        Ok(response.received_messages)
    }

    pub async fn acknowledge(
        &self,
        subscription: &ResourceIdentity,
        ack_ids: Vec<String>,
    ) -> Result<()> {
        if ack_ids.is_empty() {
            return Ok(());
        }
        let _: Empty = self
            .subscriptions
            .action(subscription, "acknowledge", &AcknowledgeRequest { ack_ids })
            .await?;
        Ok(())
    }
}
