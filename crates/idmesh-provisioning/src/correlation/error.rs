//! Correlation error types.

use idmesh_core::{AnyTypeKey, EntityId, ResourceKey};
use thiserror::Error;

use crate::search::SearchError;

/// Errors that can occur while correlating an external change.
#[derive(Debug, Error)]
pub enum CorrelationError {
    /// More than one internal candidate; never resolved automatically.
    #[error("Ambiguous correlation for '{uid}' on resource {resource}: {} candidates", candidates.len())]
    Ambiguous {
        resource: ResourceKey,
        uid: String,
        candidates: Vec<EntityId>,
    },

    /// The resource has no provision for the any type.
    #[error("Resource {resource} has no provision for {any_type}")]
    UnknownResource {
        resource: ResourceKey,
        any_type: AnyTypeKey,
    },

    /// The provision maps no external key, so key matching is impossible.
    #[error("Resource {resource} maps no key for {any_type}")]
    NoKeyMapping {
        resource: ResourceKey,
        any_type: AnyTypeKey,
    },

    /// Searching for candidates failed.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

impl CorrelationError {
    /// Whether this is an ambiguous match.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }
}

/// Result type for correlation operations.
pub type CorrelationResult<T> = Result<T, CorrelationError>;
