//! Search conditions and the entity search/paging contracts.
//!
//! Conditions are a plain AST. Parsing a textual query language and
//! executing conditions against storage both belong to the persistence
//! layer behind [`EntitySearch`] and [`EntityPager`].

use async_trait::async_trait;
use idmesh_core::{AnyTypeKey, Entity, EntityKind, LinkedAccount, ResourceKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Comparison operator of a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrOp {
    /// Exact match.
    Eq,
    /// Case-insensitive match.
    IEq,
    /// Pattern match, `%` matching any run of characters.
    Like,
    /// Case-insensitive pattern match.
    ILike,
    /// Attribute has no value.
    IsNull,
    /// Attribute has at least one value.
    IsNotNull,
}

/// Entity field addressable by a field condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityField {
    /// Entity id.
    Key,
    /// User name.
    Username,
    /// Group or any object name.
    Name,
    /// Workflow status.
    Status,
}

impl EntityField {
    /// Parse an internal attribute name naming a field.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "key" => Some(Self::Key),
            "username" => Some(Self::Username),
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// A search condition over entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchCondition {
    /// Condition on a plain attribute.
    Attr {
        schema: String,
        op: AttrOp,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expression: Option<String>,
    },
    /// Condition on an entity field.
    Field {
        field: EntityField,
        op: AttrOp,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expression: Option<String>,
    },
    /// Restrict to one any type.
    AnyType { any_type: AnyTypeKey },
    /// All sub-conditions hold.
    And { conditions: Vec<SearchCondition> },
    /// At least one sub-condition holds.
    Or { conditions: Vec<SearchCondition> },
    /// The sub-condition does not hold.
    Not { condition: Box<SearchCondition> },
}

impl SearchCondition {
    /// Attribute equals value.
    pub fn eq(schema: impl Into<String>, value: impl Into<String>) -> Self {
        Self::attr(schema, AttrOp::Eq, Some(value.into()))
    }

    /// Attribute equals value, ignoring case.
    pub fn ieq(schema: impl Into<String>, value: impl Into<String>) -> Self {
        Self::attr(schema, AttrOp::IEq, Some(value.into()))
    }

    /// Attribute has no value.
    pub fn is_null(schema: impl Into<String>) -> Self {
        Self::attr(schema, AttrOp::IsNull, None)
    }

    /// Condition on a plain attribute.
    pub fn attr(schema: impl Into<String>, op: AttrOp, expression: Option<String>) -> Self {
        Self::Attr {
            schema: schema.into(),
            op,
            expression,
        }
    }

    /// Condition on an entity field.
    pub fn field(field: EntityField, op: AttrOp, expression: Option<String>) -> Self {
        Self::Field {
            field,
            op,
            expression,
        }
    }

    /// Restrict to one any type.
    pub fn any_type(any_type: impl Into<AnyTypeKey>) -> Self {
        Self::AnyType {
            any_type: any_type.into(),
        }
    }

    /// Conjunction; a single condition is returned unchanged.
    pub fn and(mut conditions: Vec<SearchCondition>) -> Self {
        if conditions.len() == 1 {
            if let Some(only) = conditions.pop() {
                return only;
            }
        }
        Self::And { conditions }
    }

    /// Disjunction.
    pub fn or(conditions: Vec<SearchCondition>) -> Self {
        Self::Or { conditions }
    }

    /// Negation.
    pub fn negate(condition: SearchCondition) -> Self {
        Self::Not {
            condition: Box::new(condition),
        }
    }

    /// Combine this condition with another using AND.
    #[must_use]
    pub fn and_with(self, other: SearchCondition) -> Self {
        match self {
            Self::And { mut conditions } => {
                conditions.push(other);
                Self::And { conditions }
            }
            _ => Self::And {
                conditions: vec![self, other],
            },
        }
    }
}

/// Error raised by the search collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("search failed: {message}")]
pub struct SearchError {
    pub message: String,
}

impl SearchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Finds entities matching a condition.
#[async_trait]
pub trait EntitySearch: Send + Sync {
    /// Entities of `kind` matching `condition`.
    async fn search(&self, condition: &SearchCondition, kind: EntityKind)
        -> SearchResult<Vec<Entity>>;

    /// Account linked on `resource` under the given external key, if any.
    async fn find_linked_account(
        &self,
        resource: &ResourceKey,
        conn_object_key_value: &str,
    ) -> SearchResult<Option<LinkedAccount>> {
        let _ = (resource, conn_object_key_value);
        Ok(None)
    }
}

/// Pages through stored entities.
#[async_trait]
pub trait EntityPager: Send + Sync {
    /// Number of entities of `kind` matching the optional condition.
    async fn count(&self, kind: EntityKind, condition: Option<&SearchCondition>)
        -> SearchResult<usize>;

    /// One page (1-based) of entities of `kind` matching the optional condition.
    async fn page(
        &self,
        kind: EntityKind,
        condition: Option<&SearchCondition>,
        page: usize,
        size: usize,
    ) -> SearchResult<Vec<Entity>>;

    /// Keys of every any type whose kind is `ANY_OBJECT`.
    async fn any_object_types(&self) -> SearchResult<Vec<AnyTypeKey>>;
}
