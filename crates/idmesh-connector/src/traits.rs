//! Connector gateway contract.
//!
//! The gateway hides connector bundle loading and transport. Callers hand it a
//! resource, an object class and an external key; it answers with the
//! external object, with `None` when the resource holds no such object, or
//! with a [`ConnectorError`](crate::error::ConnectorError) when presence
//! could not be determined.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::mapping::ExternalResource;
use crate::operation::{ExternalObject, Uid};

/// Read access to objects on external resources.
#[async_trait]
pub trait ConnectorGateway: Send + Sync {
    /// Fetch a single object by its external key.
    ///
    /// # Arguments
    /// * `resource` - The resource to query
    /// * `object_class` - Object class from the provision (e.g. `__ACCOUNT__`)
    /// * `key` - External key value
    /// * `attributes_to_get` - External attribute names to return
    /// * `ignore_case` - Whether key matching ignores case
    ///
    /// # Returns
    /// `Ok(None)` when the object does not exist on the resource.
    async fn fetch(
        &self,
        resource: &ExternalResource,
        object_class: &str,
        key: &Uid,
        attributes_to_get: &[String],
        ignore_case: bool,
    ) -> ConnectorResult<Option<ExternalObject>>;
}
