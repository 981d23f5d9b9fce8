//! Reconciliation engine.
//!
//! Compares what an entity would look like on each of its resources with
//! what the connectors actually hold there.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use idmesh_connector::mapping::{ExternalResource, Provision};
use idmesh_connector::operation::{AttributeSet, Uid, UID_NAME};
use idmesh_connector::traits::ConnectorGateway;
use idmesh_core::{Entity, EntityId, RelationshipTypeKey};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use super::comparator::AttributeComparator;
use super::config::ReconciliationConfig;
use super::discrepancy::Discrepancy;
use super::error::{ReconciliationError, ReconciliationResult};

/// Enumerates the resources an entity is provisioned to.
#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    /// Resources of `entity`, in provisioning order.
    async fn resources_of(&self, entity: &Entity) -> ReconciliationResult<Vec<ExternalResource>>;
}

/// Which attributes of the entity a projection draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionScope {
    /// The entity's own attributes.
    None,
    /// Attributes held on a membership of the given group.
    Membership(EntityId),
    /// Attributes held on a relationship.
    Relationship {
        relationship_type: RelationshipTypeKey,
        other_end: EntityId,
    },
}

/// Error raised by an [`AttributeProjector`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProjectionError {
    pub message: String,
}

impl ProjectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Attributes an entity would be pushed with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedAttributes {
    /// External key value, when the projection computed one.
    pub key: Option<String>,
    /// Attributes by external name.
    pub attributes: AttributeSet,
}

/// Computes the external view of an entity for a provision.
pub trait AttributeProjector: Send + Sync {
    /// External key value of `entity` on the provision, if any.
    fn conn_object_key_value(
        &self,
        entity: &Entity,
        provision: &Provision,
    ) -> Result<Option<String>, ProjectionError>;

    /// The attributes a push of `entity` would send.
    fn prepare(
        &self,
        entity: &Entity,
        scope: &ProjectionScope,
        provision: &Provision,
    ) -> Result<PreparedAttributes, ProjectionError>;
}

/// Outcome of reconciling one entity across all of its resources.
#[derive(Debug, Default)]
pub struct EntityReconciliation {
    pub entity_id: EntityId,
    /// Discrepancies, grouped by resource in provisioning order.
    pub discrepancies: Vec<Discrepancy>,
    /// Resources whose state could not be determined.
    pub failures: Vec<ReconciliationError>,
}

impl EntityReconciliation {
    /// True when every resource was reached and matched.
    pub fn is_reconciled(&self) -> bool {
        self.discrepancies.is_empty() && self.failures.is_empty()
    }
}

/// Reconciles entities against their resources.
pub struct ReconciliationEngine<D, P, G>
where
    D: ResourceDirectory,
    P: AttributeProjector,
    G: ConnectorGateway,
{
    directory: Arc<D>,
    projector: Arc<P>,
    gateway: Arc<G>,
    config: ReconciliationConfig,
}

impl<D, P, G> ReconciliationEngine<D, P, G>
where
    D: ResourceDirectory,
    P: AttributeProjector,
    G: ConnectorGateway,
{
    /// Create an engine with the default configuration.
    pub fn new(directory: Arc<D>, projector: Arc<P>, gateway: Arc<G>) -> Self {
        Self::with_config(directory, projector, gateway, ReconciliationConfig::default())
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(
        directory: Arc<D>,
        projector: Arc<P>,
        gateway: Arc<G>,
        config: ReconciliationConfig,
    ) -> Self {
        Self {
            directory,
            projector,
            gateway,
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// Reconcile one entity against one resource.
    ///
    /// Returns `Ok(None)` when the resource does not apply to the entity: no
    /// provision for its any type, no key mapping item, or a blank key.
    #[instrument(skip(self, entity, resource), fields(entity_id = %entity.id, resource = %resource.key))]
    pub async fn reconcile_resource(
        &self,
        entity: &Entity,
        resource: &ExternalResource,
    ) -> ReconciliationResult<Option<Vec<Discrepancy>>> {
        let Some(provision) = resource.provision(&entity.any_type) else {
            debug!(any_type = %entity.any_type, "No provision, skipping resource");
            return Ok(None);
        };
        let Some(key_item) = provision.conn_object_key_item() else {
            debug!("No key mapping item, skipping resource");
            return Ok(None);
        };

        let key = self
            .projector
            .conn_object_key_value(entity, provision)
            .map_err(|e| projection_error(resource, e))?;
        let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
            debug!("Blank key value, skipping resource");
            return Ok(None);
        };

        let attributes_to_get = provision
            .mapping
            .as_ref()
            .map(|m| m.attributes_to_get())
            .unwrap_or_default();

        let fetched = self
            .gateway
            .fetch(
                resource,
                &provision.object_class,
                &Uid::new(key_item.ext_attr_name.clone(), key.clone()),
                &attributes_to_get,
                provision.ignore_case_match,
            )
            .await
            .map_err(|source| {
                error!(error = %source, "Connector fetch failed");
                ReconciliationError::Connector {
                    resource: resource.key.clone(),
                    source,
                }
            })?;

        let Some(object) = fetched else {
            warn!(key = %key, "Object not found on resource");
            return Ok(Some(vec![Discrepancy::Missing {
                resource: resource.key.clone(),
                conn_object_key_value: key,
            }]));
        };

        let prepared = self
            .projector
            .prepare(entity, &ProjectionScope::None, provision)
            .map_err(|e| projection_error(resource, e))?;

        let excluded = &self.config.excluded_attributes;
        let prepared_key = prepared.key.clone().unwrap_or_else(|| key.clone());
        let mut internal = prepared.attributes.normalized(excluded);
        for name in [UID_NAME, key_item.ext_attr_name.as_str()] {
            if !excluded.iter().any(|e| e == name) {
                internal
                    .entry(name.to_string())
                    .or_default()
                    .insert(prepared_key.clone());
            }
        }
        let external = object.normalized_attributes(excluded);

        let discrepancies = AttributeComparator::new(&resource.key, &key).compare(&internal, &external);
        if !discrepancies.is_empty() {
            debug!(count = discrepancies.len(), "Attributes misaligned");
        }
        Ok(Some(discrepancies))
    }

    /// Reconcile one entity against every resource it is provisioned to.
    ///
    /// A failing resource is recorded and does not stop the others.
    #[instrument(skip(self, entity), fields(entity_id = %entity.id))]
    pub async fn reconcile(&self, entity: &Entity) -> EntityReconciliation {
        let mut outcome = EntityReconciliation {
            entity_id: entity.id,
            ..Default::default()
        };

        let resources = match self.directory.resources_of(entity).await {
            Ok(resources) => resources,
            Err(e) => {
                error!(error = %e, "Could not enumerate resources");
                outcome.failures.push(e);
                return outcome;
            }
        };

        let results: Vec<_> = stream::iter(resources.iter())
            .map(|resource| self.reconcile_resource(entity, resource))
            .buffered(self.config.effective_concurrency())
            .collect()
            .await;

        for result in results {
            match result {
                Ok(Some(discrepancies)) => outcome.discrepancies.extend(discrepancies),
                Ok(None) => {}
                Err(e) => outcome.failures.push(e),
            }
        }
        outcome
    }

    /// Reconcile a page of entities.
    ///
    /// Only entities with at least one discrepancy or failure are returned,
    /// in page order.
    #[instrument(skip(self, entities), fields(page_len = entities.len()))]
    pub async fn reconcile_page(&self, entities: &[Entity]) -> Vec<EntityReconciliation> {
        stream::iter(entities.iter())
            .map(|entity| self.reconcile(entity))
            .buffered(self.config.effective_concurrency())
            .filter(|outcome| futures::future::ready(!outcome.is_reconciled()))
            .collect()
            .await
    }
}

fn projection_error(resource: &ExternalResource, err: ProjectionError) -> ReconciliationError {
    ReconciliationError::Projection {
        resource: resource.key.clone(),
        message: err.message,
    }
}
