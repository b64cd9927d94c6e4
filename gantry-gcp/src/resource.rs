//! Idempotent resource provisioning
//!
//! A [`ResourceClient`] drives get / create / get-or-create / update /
//! delete for one [`ResourceKind`] over a shared transport. Statuses are
//! only ever produced by decoding a successful response.

use crate::metrics::PROVISION_TOTAL;
use crate::transport::AuthenticatedTransport;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use gantry_core::{wire, ResourceIdentity};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a kind's create call is shaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStyle {
    /// `POST {parent}/{collection}` with the name in the body
    PostToCollection,
    /// `POST {parent}/{collection}?{param}={id}`
    PostWithIdParam(&'static str),
    /// `PUT {name}`
    PutToName,
}

/// A provisionable resource type
pub trait ResourceKind: Send + Sync + 'static {
    /// Singular name for logs and metrics ("queue", "topic")
    const KIND: &'static str;
    /// Collection segment in resource paths ("queues", "topics")
    const COLLECTION: &'static str;
    const CREATE_STYLE: CreateStyle;
    /// Top-level keys dropped from create bodies
    const CREATE_EXCLUDE: &'static [&'static str] = &[];
    /// Top-level keys dropped from update bodies and masks
    const UPDATE_EXCLUDE: &'static [&'static str] = &["name"];

    /// Desired state sent by the caller
    type Spec: Serialize + Send + Sync;
    /// Observed state returned by the service
    type Status: DeserializeOwned + Send;
}

/// Where a provisioning call is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Unchecked,
    Found,
    NotFound,
    Creating,
    Created,
    CreateFailed,
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::Unchecked => "unchecked",
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Creating => "creating",
            Self::Created => "created",
            Self::CreateFailed => "create_failed",
        };
        f.write_str(state)
    }
}

/// State machine for one get-or-create call
#[derive(Debug, Clone)]
pub struct Lifecycle {
    current_state: ProvisionState,
    state_history: Vec<(ProvisionState, DateTime<Utc>)>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            current_state: ProvisionState::Unchecked,
            state_history: vec![(ProvisionState::Unchecked, Utc::now())],
        }
    }

    pub fn state(&self) -> ProvisionState {
        self.current_state
    }

    /// Transition to a new state
    pub fn transition(&mut self, new_state: ProvisionState) -> Result<()> {
        if !self.is_valid_transition(new_state) {
            return Err(Error::InvalidTransition {
                from: self.current_state,
                to: new_state,
            });
        }

        self.current_state = new_state;
        self.state_history.push((new_state, Utc::now()));
        Ok(())
    }

    fn is_valid_transition(&self, new_state: ProvisionState) -> bool {
        use ProvisionState::*;

        matches!(
            (self.current_state, new_state),
            (Unchecked, Found | NotFound) | (NotFound, Creating) | (Creating, Created | CreateFailed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        use ProvisionState::*;
        matches!(self.current_state, Found | Created | CreateFailed)
    }

    pub fn history(&self) -> &[(ProvisionState, DateTime<Utc>)] {
        &self.state_history
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of [`ResourceClient::get_or_create`]
#[derive(Debug, Clone, PartialEq)]
pub struct Provisioned<S> {
    /// `Found` or `Created`
    pub state: ProvisionState,
    pub status: S,
}

impl<S> Provisioned<S> {
    pub fn was_created(&self) -> bool {
        self.state == ProvisionState::Created
    }

    pub fn into_status(self) -> S {
        self.status
    }
}

/// Lifecycle operations for one resource kind
pub struct ResourceClient<K: ResourceKind> {
    transport: Arc<AuthenticatedTransport>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> Clone for ResourceClient<K> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            _kind: PhantomData,
        }
    }
}

impl<K: ResourceKind> fmt::Debug for ResourceClient<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("kind", &K::KIND)
            .field("transport", &self.transport)
            .finish()
    }
}

impl<K: ResourceKind> ResourceClient<K> {
    pub fn new(transport: Arc<AuthenticatedTransport>) -> Self {
        Self {
            transport,
            _kind: PhantomData,
        }
    }

    pub fn transport(&self) -> &AuthenticatedTransport {
        &self.transport
    }

    /// Drop this handle, closing the transport if no clone still uses it
    pub fn close(self) -> bool {
        AuthenticatedTransport::close_shared(self.transport)
    }

    /// Read a resource.
    ///
    /// `404` is returned as [`Error::NotFound`].
    #[tracing::instrument(name = "resource.get", skip_all, fields(kind = K::KIND, resource = %id))]
    pub async fn get(&self, id: &ResourceIdentity) -> Result<K::Status> {
        self.get_with(id, &[]).await
    }

    /// [`get`](Self::get) with extra query parameters (e.g. `view`)
    pub async fn get_with(
        &self,
        id: &ResourceIdentity,
        query: &[(&str, String)],
    ) -> Result<K::Status> {
        id.ensure_collection(K::COLLECTION)?;
        let name = id.to_string();
        let status = self
            .transport
            .send(Method::GET, &name, query, None)
            .await?
            .into_success(&name)?
            .decode()?;
        debug!(resource = %name, "Resource found");
        Ok(status)
    }

    /// Like [`get`](Self::get), with absence as `None`
    pub async fn lookup(&self, id: &ResourceIdentity) -> Result<Option<K::Status>> {
        match self.get(id).await {
            Ok(status) => Ok(Some(status)),
            Err(Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a resource with one write. No retry.
    #[tracing::instrument(name = "resource.create", skip_all, fields(kind = K::KIND, resource = %id))]
    pub async fn create(&self, id: &ResourceIdentity, spec: &K::Spec) -> Result<K::Status> {
        id.ensure_collection(K::COLLECTION)?;
        let name = id.to_string();
        let (body, _) = wire::encode_partial(spec, K::CREATE_EXCLUDE)?;

        let response = match K::CREATE_STYLE {
            CreateStyle::PostToCollection => {
                let collection = collection_path(id)?;
                self.transport
                    .send(Method::POST, &collection, &[], Some(&body))
                    .await?
            }
            CreateStyle::PostWithIdParam(param) => {
                let collection = collection_path(id)?;
                self.transport
                    .send(
                        Method::POST,
                        &collection,
                        &[(param, id.id().to_string())],
                        Some(&body),
                    )
                    .await?
            }
            CreateStyle::PutToName => {
                self.transport
                    .send(Method::PUT, &name, &[], Some(&body))
                    .await?
            }
        };

        let status = response.into_success(&name)?.decode()?;
        info!(resource = %name, "Resource created");
        Ok(status)
    }

    /// Read, and create only when absent.
    ///
    /// At most two round trips; an existing resource is never written.
    #[tracing::instrument(name = "resource.get_or_create", skip_all, fields(kind = K::KIND, resource = %id))]
    pub async fn get_or_create(
        &self,
        id: &ResourceIdentity,
        spec: &K::Spec,
    ) -> Result<Provisioned<K::Status>> {
        let mut lifecycle = Lifecycle::new();

        match self.get(id).await {
            Ok(status) => {
                lifecycle.transition(ProvisionState::Found)?;
                PROVISION_TOTAL.with_label_values(&[K::KIND, "found"]).inc();
                return Ok(Provisioned {
                    state: lifecycle.state(),
                    status,
                });
            }
            Err(Error::NotFound { .. }) => lifecycle.transition(ProvisionState::NotFound)?,
            Err(e) => return Err(e),
        }

        lifecycle.transition(ProvisionState::Creating)?;
        match self.create(id, spec).await {
            Ok(status) => {
                lifecycle.transition(ProvisionState::Created)?;
                PROVISION_TOTAL.with_label_values(&[K::KIND, "created"]).inc();
                Ok(Provisioned {
                    state: lifecycle.state(),
                    status,
                })
            }
            Err(e) => {
                lifecycle.transition(ProvisionState::CreateFailed)?;
                PROVISION_TOTAL.with_label_values(&[K::KIND, "failed"]).inc();
                warn!(error = %e, "Resource creation failed");
                Err(e)
            }
        }
    }

    /// PATCH the fields set on `spec`, naming them in `updateMask`
    #[tracing::instrument(name = "resource.update", skip_all, fields(kind = K::KIND, resource = %id))]
    pub async fn update(&self, id: &ResourceIdentity, spec: &K::Spec) -> Result<K::Status> {
        id.ensure_collection(K::COLLECTION)?;
        let name = id.to_string();
        let (body, mask) = wire::encode_partial(spec, K::UPDATE_EXCLUDE)?;
        if mask.is_empty() {
            return Err(Error::Config(format!(
                "update of {} sets no fields",
                name
            )));
        }

        let status = self
            .transport
            .send(
                Method::PATCH,
                &name,
                &[("updateMask", mask.to_string())],
                Some(&body),
            )
            .await?
            .into_success(&name)?
            .decode()?;
        info!(resource = %name, update_mask = %mask, "Resource updated");
        Ok(status)
    }

    /// Delete a resource; `Ok(true)` on success
    #[tracing::instrument(name = "resource.delete", skip_all, fields(kind = K::KIND, resource = %id))]
    pub async fn delete(&self, id: &ResourceIdentity) -> Result<bool> {
        id.ensure_collection(K::COLLECTION)?;
        let name = id.to_string();
        self.transport
            .send(Method::DELETE, &name, &[], None)
            .await?
            .into_success(&name)?;
        info!(resource = %name, "Resource deleted");
        Ok(true)
    }

    /// `POST {name}:{verb}` with a JSON body, decoding the reply
    #[tracing::instrument(name = "resource.action", skip_all, fields(kind = K::KIND, resource = %id, verb = verb))]
    pub async fn action<B, R>(&self, id: &ResourceIdentity, verb: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        id.ensure_collection(K::COLLECTION)?;
        let body = wire::encode(body)?;
        let path = format!("{}:{}", id, verb);
        self.transport
            .send(Method::POST, &path, &[], Some(&body))
            .await?
            .into_success(&id.to_string())?
            .decode()
    }
}

fn collection_path(id: &ResourceIdentity) -> Result<String> {
    let parent = id.parent().ok_or_else(|| {
        Error::Config(format!("resource '{}' has no parent to create under", id))
    })?;
    Ok(format!("{}/{}", parent, id.collection()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), ProvisionState::Unchecked);
        assert!(!lifecycle.is_terminal());
    }

    #[test]
    fn test_create_path() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.transition(ProvisionState::NotFound).unwrap();
        lifecycle.transition(ProvisionState::Creating).unwrap();
        lifecycle.transition(ProvisionState::Created).unwrap();
        assert!(lifecycle.is_terminal());
        assert_eq!(lifecycle.history().len(), 4);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut lifecycle = Lifecycle::new();
        assert!(matches!(
            lifecycle.transition(ProvisionState::Creating),
            Err(Error::InvalidTransition {
                from: ProvisionState::Unchecked,
                to: ProvisionState::Creating
            })
        ));

        lifecycle.transition(ProvisionState::Found).unwrap();
        assert!(lifecycle.transition(ProvisionState::Creating).is_err());
        assert_eq!(lifecycle.state(), ProvisionState::Found);
    }

    #[test]
    fn collection_path_strips_id() {
        let id = ResourceIdentity::parse("projects/p/locations/l/queues/q1").unwrap();
        assert_eq!(
            collection_path(&id).unwrap(),
            "projects/p/locations/l/queues"
        );

        let root = ResourceIdentity::parse("projects/p").unwrap();
        assert!(collection_path(&root).is_err());
    }
}
