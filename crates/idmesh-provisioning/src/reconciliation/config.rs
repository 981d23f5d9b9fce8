//! Reconciliation configuration.

use idmesh_connector::operation::{ENABLE_NAME, PASSWORD_NAME};
use serde::{Deserialize, Serialize};

/// Configuration for the reconciliation engine and report runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// Entities per page when running a report.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Connector fetches in flight at once for one entity, and entities of
    /// one page reconciled at once.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Attribute names never compared.
    #[serde(default = "default_excluded_attributes")]
    pub excluded_attributes: Vec<String>,
}

fn default_page_size() -> usize {
    10
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_excluded_attributes() -> Vec<String> {
    vec![PASSWORD_NAME.to_string(), ENABLE_NAME.to_string()]
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            excluded_attributes: default_excluded_attributes(),
        }
    }
}

impl ReconciliationConfig {
    /// Page size, never zero.
    pub fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }

    /// Concurrency limit, never zero.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }
}
