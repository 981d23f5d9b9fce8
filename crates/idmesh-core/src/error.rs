//! Error Types
//!
//! Errors raised while building or navigating the entity model.
//!
//! # Example
//!
//! ```
//! use idmesh_core::{EntityKind, ModelError, Result};
//!
//! fn membership_allowed(kind: EntityKind) -> Result<()> {
//!     if !kind.capabilities().memberships {
//!         return Err(ModelError::UnsupportedEdge {
//!             kind,
//!             edge: "membership",
//!         });
//!     }
//!     Ok(())
//! }
//!
//! assert!(membership_allowed(EntityKind::Group).is_err());
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::entity::EntityKind;

/// Standardized error type for the idmesh data model.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelError {
    /// A referenced model object does not exist.
    #[error("{resource} not found{}", id.as_ref().map(|i| format!(": {i}")).unwrap_or_default())]
    NotFound {
        /// The type of object that was not found (e.g., "Entity", "AnyType")
        resource: String,
        /// Optional identifier of the object
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// An edge was attached to a kind whose capability table forbids it.
    #[error("{kind} entities cannot carry a {edge}")]
    UnsupportedEdge {
        /// Kind of the entity the edge was added to
        kind: EntityKind,
        /// Edge type, `membership` or `relationship`
        edge: &'static str,
    },

    /// Input validation failure.
    #[error("Validation error on field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },
}

impl ModelError {
    /// Create a not-found error for the given object type and id.
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.to_string()),
        }
    }

    /// Create a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Type alias for Results using `ModelError`.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_with_id() {
        let error = ModelError::not_found("Entity", "42");
        assert_eq!(error.to_string(), "Entity not found: 42");
    }

    #[test]
    fn test_not_found_display_without_id() {
        let error = ModelError::NotFound {
            resource: "AnyType".to_string(),
            id: None,
        };
        assert_eq!(error.to_string(), "AnyType not found");
    }

    #[test]
    fn test_unsupported_edge_display() {
        let error = ModelError::UnsupportedEdge {
            kind: EntityKind::Group,
            edge: "relationship",
        };
        assert_eq!(error.to_string(), "GROUP entities cannot carry a relationship");
    }

    #[test]
    fn test_serialization_is_tagged() {
        let error = ModelError::validation("name", "must not be blank");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["type"], "validation");
        assert_eq!(json["field"], "name");
    }
}
