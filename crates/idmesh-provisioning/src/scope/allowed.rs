//! The allowed-schema set of an entity.

use std::collections::BTreeMap;

use idmesh_core::{AttrScope, EntityId, RelationshipTypeKey, Schema, SchemaKey};
use serde::Serialize;

/// Schemas keyed by schema key.
pub type SchemaSet = BTreeMap<SchemaKey, Schema>;

/// Schemas an entity may carry, split by where the attribute lives.
///
/// Every map is always present; an entity without memberships simply has
/// an empty `for_memberships`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllowedSchemas {
    /// Schemas for attributes held directly by the entity.
    pub for_self: SchemaSet,
    /// Schemas for attributes on the membership in each group.
    pub for_memberships: BTreeMap<EntityId, SchemaSet>,
    /// Schemas for attributes on relationships of each type.
    pub for_relationship_types: BTreeMap<RelationshipTypeKey, SchemaSet>,
}

impl AllowedSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_self<I: IntoIterator<Item = Schema>>(&mut self, schemas: I) {
        extend(&mut self.for_self, schemas);
    }

    pub(crate) fn add_membership<I: IntoIterator<Item = Schema>>(
        &mut self,
        group: EntityId,
        schemas: I,
    ) {
        extend(self.for_memberships.entry(group).or_default(), schemas);
    }

    pub(crate) fn add_relationship_type<I: IntoIterator<Item = Schema>>(
        &mut self,
        relationship_type: RelationshipTypeKey,
        schemas: I,
    ) {
        extend(
            self.for_relationship_types
                .entry(relationship_type)
                .or_default(),
            schemas,
        );
    }

    /// Whether the entity itself may carry the schema.
    pub fn self_contains(&self, schema: &str) -> bool {
        self.for_self.contains_key(schema)
    }

    /// Whether the membership in `group` may carry the schema.
    pub fn membership_contains(&self, group: EntityId, schema: &str) -> bool {
        self.for_memberships
            .get(&group)
            .is_some_and(|set| set.contains_key(schema))
    }

    /// Whether relationships of the given type may carry the schema.
    pub fn relationship_type_contains(
        &self,
        relationship_type: &RelationshipTypeKey,
        schema: &str,
    ) -> bool {
        self.for_relationship_types
            .get(relationship_type)
            .is_some_and(|set| set.contains_key(schema))
    }

    /// The schema definition allowed in `scope`, if any.
    pub fn lookup(&self, scope: &AttrScope, schema: &str) -> Option<&Schema> {
        match scope {
            AttrScope::Own => self.for_self.get(schema),
            AttrScope::Membership { group } => self
                .for_memberships
                .get(group)
                .and_then(|set| set.get(schema)),
            AttrScope::Relationship {
                relationship_type, ..
            } => self
                .for_relationship_types
                .get(relationship_type)
                .and_then(|set| set.get(schema)),
        }
    }

    /// Whether the schema is allowed anywhere: on the entity, on any
    /// membership or on any relationship type.
    pub fn contains_anywhere(&self, schema: &str) -> bool {
        self.self_contains(schema)
            || self.for_memberships.values().any(|s| s.contains_key(schema))
            || self
                .for_relationship_types
                .values()
                .any(|s| s.contains_key(schema))
    }
}

fn extend<I: IntoIterator<Item = Schema>>(set: &mut SchemaSet, schemas: I) {
    for schema in schemas {
        set.entry(schema.key.clone()).or_insert(schema);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_maps_answer_false() {
        let allowed = AllowedSchemas::new();
        assert!(!allowed.self_contains("email"));
        assert!(!allowed.membership_contains(EntityId::new(), "badge"));
        assert!(!allowed.relationship_type_contains(&RelationshipTypeKey::new("neighbor"), "x"));
        assert!(allowed.lookup(&AttrScope::Own, "email").is_none());
    }

    #[test]
    fn test_lookup_per_scope() {
        let group = EntityId::new();
        let mut allowed = AllowedSchemas::new();
        allowed.add_self([Schema::plain("email")]);
        allowed.add_membership(group, [Schema::plain("badge")]);
        allowed.add_membership(group, [Schema::plain("badge"), Schema::plain("floor")]);

        assert!(allowed.lookup(&AttrScope::Own, "email").is_some());
        assert!(allowed.lookup(&AttrScope::Own, "badge").is_none());
        assert!(allowed
            .lookup(&AttrScope::Membership { group }, "badge")
            .is_some());
        assert_eq!(allowed.for_memberships[&group].len(), 2);
        assert!(allowed.contains_anywhere("floor"));
    }
}
