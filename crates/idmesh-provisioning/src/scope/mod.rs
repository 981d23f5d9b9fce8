//! # Schema Scope
//!
//! Computes which schemas an entity may carry and validates its attributes.
//!
//! An entity's scope has three parts:
//!
//! - **self**: schemas of the type classes owned by its any type plus its
//!   auxiliary classes
//! - **per membership**: schemas granted by the type extensions of each group
//!   the entity belongs to
//! - **per relationship type**: schemas granted by the type extensions of
//!   each relationship type the entity participates in
//!
//! ## Usage
//!
//! ```ignore
//! use idmesh_provisioning::scope::SchemaScopeResolver;
//!
//! let allowed = SchemaScopeResolver::resolve(&bob, SchemaKind::Plain, &catalog);
//! assert!(allowed.membership_contains(staff, "badge"));
//!
//! SchemaScopeResolver::validate(&bob, &catalog, &index).await?;
//! ```

pub mod allowed;
pub mod catalog;
pub mod error;
pub mod resolver;

pub use allowed::{AllowedSchemas, SchemaSet};
pub use catalog::{InMemorySchemaCatalog, SchemaCatalog};
pub use error::{ScopeError, ScopeResult};
pub use resolver::{SchemaScopeResolver, UniquenessIndex};
