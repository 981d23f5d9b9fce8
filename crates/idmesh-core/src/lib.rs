//! idmesh Core Library
//!
//! Shared identifiers and the entity/schema data model for idmesh.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (EntityId, SchemaKey, ResourceKey, ...)
//! - [`entity`] - Users, groups and any objects with their memberships and relationships
//! - [`schema`] - Schemas, type classes, any types and type extensions
//! - [`error`] - Model error type (ModelError)
//!
//! # Example
//!
//! ```
//! use idmesh_core::{Entity, EntityId, Membership, PlainAttr};
//!
//! let staff = EntityId::new();
//! let bob = Entity::user("bob")
//!     .with_attr(PlainAttr::single("email", "bob@example.com"))
//!     .with_membership(Membership::new(staff))
//!     .unwrap();
//!
//! assert_eq!(bob.memberships().len(), 1);
//! ```

pub mod entity;
pub mod error;
pub mod ids;
pub mod schema;

// Re-export main types for convenient access
pub use entity::{
    AttrScope, Entity, EntityKind, KindCapabilities, LinkedAccount, Membership, PlainAttr,
    Relationship, UserDetails, GROUP_ANY_TYPE, USER_ANY_TYPE,
};
pub use error::{ModelError, Result};
pub use ids::{
    AnyTypeKey, EntityId, LinkedAccountId, ParseIdError, RelationshipTypeKey, ResourceKey,
    SchemaKey, TypeClassKey,
};
pub use schema::{
    AnyType, AttrValueType, GroupTypeExtension, RelationshipTypeExtension, Schema, SchemaKind,
    TypeClass,
};
