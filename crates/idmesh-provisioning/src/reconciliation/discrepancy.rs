//! Discrepancy model.

use std::collections::BTreeSet;
use std::fmt;

use idmesh_core::ResourceKey;
use serde::{Deserialize, Serialize};

/// Type of discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyType {
    /// The object is absent on the resource.
    Missing,
    /// The object exists but an attribute differs.
    Misaligned,
}

impl DiscrepancyType {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyType::Missing => "missing",
            DiscrepancyType::Misaligned => "misaligned",
        }
    }
}

impl fmt::Display for DiscrepancyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A difference between internal and external state for one
/// entity/resource pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discrepancy {
    /// No object with the external key exists on the resource.
    Missing {
        resource: ResourceKey,
        conn_object_key_value: String,
    },
    /// The object exists but one attribute holds different values.
    ///
    /// `on_internal` and `on_external` are never both empty and never equal.
    Misaligned {
        resource: ResourceKey,
        conn_object_key_value: String,
        attribute: String,
        on_internal: BTreeSet<String>,
        on_external: BTreeSet<String>,
    },
}

impl Discrepancy {
    /// Type of this discrepancy.
    pub fn discrepancy_type(&self) -> DiscrepancyType {
        match self {
            Self::Missing { .. } => DiscrepancyType::Missing,
            Self::Misaligned { .. } => DiscrepancyType::Misaligned,
        }
    }

    pub fn resource(&self) -> &ResourceKey {
        match self {
            Self::Missing { resource, .. } | Self::Misaligned { resource, .. } => resource,
        }
    }

    pub fn conn_object_key_value(&self) -> &str {
        match self {
            Self::Missing {
                conn_object_key_value,
                ..
            }
            | Self::Misaligned {
                conn_object_key_value,
                ..
            } => conn_object_key_value,
        }
    }

    /// Attribute name, for misaligned discrepancies.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Missing { .. } => None,
            Self::Misaligned { attribute, .. } => Some(attribute),
        }
    }
}
