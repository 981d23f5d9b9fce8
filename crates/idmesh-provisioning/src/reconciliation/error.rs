//! Reconciliation error types.

use idmesh_connector::error::ConnectorError;
use idmesh_core::ResourceKey;
use thiserror::Error;

use crate::search::SearchError;

/// Errors that can occur during reconciliation.
///
/// A connector fault is never turned into a discrepancy: "object absent" is a
/// data fact, "could not determine presence" is an operational fault.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// The connector failed while fetching from a resource.
    #[error("Connector error on resource {resource}: {source}")]
    Connector {
        resource: ResourceKey,
        #[source]
        source: ConnectorError,
    },

    /// The attribute projector failed for a resource.
    #[error("Projection error on resource {resource}: {message}")]
    Projection {
        resource: ResourceKey,
        message: String,
    },

    /// The resources of an entity could not be enumerated.
    #[error("Resource directory error: {message}")]
    Directory { message: String },

    /// Paging through entities failed.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

impl ReconciliationError {
    /// Create a directory error.
    pub fn directory(message: impl Into<String>) -> Self {
        Self::Directory {
            message: message.into(),
        }
    }

    /// The resource this error is tagged with, if any.
    pub fn resource(&self) -> Option<&ResourceKey> {
        match self {
            Self::Connector { resource, .. } | Self::Projection { resource, .. } => Some(resource),
            Self::Directory { .. } | Self::Search(_) => None,
        }
    }

    /// Whether retrying may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connector { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

/// Result type for reconciliation operations.
pub type ReconciliationResult<T> = Result<T, ReconciliationError>;
