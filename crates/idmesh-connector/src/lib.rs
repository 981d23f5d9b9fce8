//! # Connector Framework
//!
//! Connector-side abstractions for reading identity data back from external
//! resources (LDAP directories, databases, SaaS APIs).
//!
//! ## Architecture
//!
//! - [`ConnectorGateway`](traits::ConnectorGateway) - Fetch an object by external key
//! - [`ExternalResource`](mapping::ExternalResource) / [`Provision`](mapping::Provision) - Which
//!   object class an any type is provisioned to and how its attributes map
//! - [`ExternalObject`](operation::ExternalObject) - The connector's view of a record
//!
//! ## Example
//!
//! ```
//! use idmesh_connector::prelude::*;
//!
//! let resource = ExternalResource::new("resource-ldap").with_provision(
//!     Provision::new("USER", "__ACCOUNT__").with_mapping(Mapping::new(vec![
//!         MappingItem::key("username", "uid"),
//!         MappingItem::new("email", "mail"),
//!     ])),
//! );
//!
//! let provision = resource.provision(&"USER".into()).unwrap();
//! assert_eq!(provision.mapping.as_ref().unwrap().attributes_to_get(), vec!["uid", "mail"]);
//! ```
//!
//! ## Crate Organization
//!
//! - [`error`] - Error types with transient/permanent classification
//! - [`traits`] - The connector gateway contract
//! - [`operation`] - Uid, `AttributeSet`, `AttributeValue`, `ExternalObject`
//! - [`mapping`] - Resources, provisions and mapping items

pub mod error;
pub mod mapping;
pub mod operation;
pub mod traits;

/// Prelude module for convenient imports.
///
/// ```
/// use idmesh_connector::prelude::*;
/// ```
pub mod prelude {
    // Error handling
    pub use crate::error::{ConnectorError, ConnectorResult};

    // Traits
    pub use crate::traits::ConnectorGateway;

    // Operations
    pub use crate::operation::{
        AttributeSet, AttributeValue, ExternalObject, Uid, ENABLE_NAME, NAME_NAME, PASSWORD_NAME,
        UID_NAME,
    };

    // Mapping
    pub use crate::mapping::{ExternalResource, Mapping, MappingItem, MappingPurpose, Provision};
}

// Re-export async_trait for gateway implementors
pub use async_trait::async_trait;
