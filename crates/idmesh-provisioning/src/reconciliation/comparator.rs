//! Attribute-set comparison.

use std::collections::{BTreeMap, BTreeSet};

use idmesh_core::ResourceKey;

use super::discrepancy::Discrepancy;

/// Normalised attributes: name to unordered value set.
pub type AttributeValues = BTreeMap<String, BTreeSet<String>>;

/// Compares the prepared (internal) attributes with the fetched (external)
/// ones for a single resource.
pub struct AttributeComparator<'a> {
    resource: &'a ResourceKey,
    conn_object_key_value: &'a str,
}

impl<'a> AttributeComparator<'a> {
    pub fn new(resource: &'a ResourceKey, conn_object_key_value: &'a str) -> Self {
        Self {
            resource,
            conn_object_key_value,
        }
    }

    /// Diff both sides.
    ///
    /// Names present only internally come first, then every external name
    /// whose values differ. An absent attribute is the same as an empty one.
    pub fn compare(&self, internal: &AttributeValues, external: &AttributeValues) -> Vec<Discrepancy> {
        let empty = BTreeSet::new();
        let mut discrepancies = Vec::new();

        for (name, values) in internal {
            if !external.contains_key(name) && !values.is_empty() {
                discrepancies.push(self.misaligned(name, values, &empty));
            }
        }

        for (name, values) in external {
            let on_internal = internal.get(name).unwrap_or(&empty);
            if on_internal != values {
                discrepancies.push(self.misaligned(name, on_internal, values));
            }
        }

        discrepancies
    }

    fn misaligned(
        &self,
        attribute: &str,
        on_internal: &BTreeSet<String>,
        on_external: &BTreeSet<String>,
    ) -> Discrepancy {
        Discrepancy::Misaligned {
            resource: self.resource.clone(),
            conn_object_key_value: self.conn_object_key_value.to_string(),
            attribute: attribute.to_string(),
            on_internal: on_internal.clone(),
            on_external: on_external.clone(),
        }
    }
}
