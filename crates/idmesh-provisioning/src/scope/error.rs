//! Scope validation error types.

use idmesh_core::{AnyTypeKey, AttrScope, SchemaKey};
use thiserror::Error;

/// Errors raised while validating an entity's attributes against its scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// An attribute uses a schema outside the entity's resolved scope.
    #[error("schema '{schema}' is not allowed for {any_type} ({scope})")]
    SchemaViolation {
        any_type: AnyTypeKey,
        schema: SchemaKey,
        scope: AttrScope,
    },

    /// Another entity already owns a value of a unique schema.
    #[error("value '{value}' of unique schema '{schema}' is already in use")]
    DuplicateValue { schema: SchemaKey, value: String },

    /// The uniqueness index could not be queried.
    #[error("uniqueness index error: {message}")]
    Index { message: String },
}

impl ScopeError {
    /// Create an index error.
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index {
            message: message.into(),
        }
    }

    /// Whether this is a unique-constraint breach, whether detected by the
    /// pre-check or reported late by the storage layer.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateValue { .. })
    }
}

/// Result type for scope operations.
pub type ScopeResult<T> = Result<T, ScopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display_names_scope() {
        let err = ScopeError::SchemaViolation {
            any_type: AnyTypeKey::new("USER"),
            schema: SchemaKey::new("badge"),
            scope: AttrScope::Own,
        };
        assert_eq!(err.to_string(), "schema 'badge' is not allowed for USER (own)");
        assert!(!err.is_duplicate());
    }

    #[test]
    fn test_duplicate_classification() {
        let err = ScopeError::DuplicateValue {
            schema: SchemaKey::new("userId"),
            value: "bob@example.com".to_string(),
        };
        assert!(err.is_duplicate());
    }
}
