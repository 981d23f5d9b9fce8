//! Schema scope resolution and attribute validation.

use std::collections::BTreeSet;

use async_trait::async_trait;
use idmesh_core::{
    Entity, EntityId, EntityKind, GroupTypeExtension, RelationshipTypeKey, Schema, SchemaKind,
    TypeClassKey,
};
use tracing::{debug, instrument};

use super::allowed::AllowedSchemas;
use super::catalog::SchemaCatalog;
use super::error::{ScopeError, ScopeResult};

/// Shared index answering whether a unique value is already taken.
#[async_trait]
pub trait UniquenessIndex: Send + Sync {
    /// Whether an entity other than `entity` already holds `value` for `schema`.
    async fn exists(&self, entity: EntityId, schema: &Schema, value: &str) -> ScopeResult<bool>;
}

/// Computes the schemas an entity may carry and validates its attributes.
///
/// Stateless: the catalog and the uniqueness index are passed on every call,
/// so nothing is cached between calls and a changed membership is seen on
/// the next call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaScopeResolver;

impl SchemaScopeResolver {
    /// Resolve the allowed schemas of `kind` for the entity.
    pub fn resolve<C>(entity: &Entity, kind: SchemaKind, catalog: &C) -> AllowedSchemas
    where
        C: SchemaCatalog + ?Sized,
    {
        let mut allowed = AllowedSchemas::new();

        let mut own_classes: BTreeSet<TypeClassKey> =
            catalog.classes_of(entity).into_iter().collect();
        own_classes.extend(entity.aux_classes.iter().cloned());
        for class in &own_classes {
            allowed.add_self(catalog.schemas_of(class, kind));
        }

        let caps = entity.kind.capabilities();

        if caps.memberships {
            for membership in entity.memberships() {
                let extensions = catalog.group_extensions_of(membership.group);
                let classes = extensions
                    .iter()
                    .filter(|te| extension_applies(entity, te))
                    .flat_map(|te| te.aux_classes.iter());
                let schemas: Vec<Schema> = classes
                    .flat_map(|class| catalog.schemas_of(class, kind))
                    .collect();
                allowed.add_membership(membership.group, schemas);
            }
        }

        if caps.relationships {
            let types: BTreeSet<&RelationshipTypeKey> = entity
                .relationships()
                .iter()
                .map(|r| &r.relationship_type)
                .collect();
            for relationship_type in types {
                let schemas: Vec<Schema> = catalog
                    .relationship_extensions_of(relationship_type)
                    .iter()
                    .flat_map(|te| te.aux_classes.iter())
                    .flat_map(|class| catalog.schemas_of(class, kind))
                    .collect();
                allowed.add_relationship_type(relationship_type.clone(), schemas);
            }
        }

        allowed
    }

    /// Validate every plain attribute of the entity against its scope, then
    /// check unique schemas against the index.
    ///
    /// Fails on the first violation: own attributes first, then membership
    /// attributes, then relationship attributes. Returns the resolved scope
    /// on success.
    #[instrument(skip(entity, catalog, index), fields(entity_id = %entity.id, any_type = %entity.any_type))]
    pub async fn validate<C, U>(
        entity: &Entity,
        catalog: &C,
        index: &U,
    ) -> ScopeResult<AllowedSchemas>
    where
        C: SchemaCatalog + ?Sized,
        U: UniquenessIndex + ?Sized,
    {
        let allowed = Self::resolve(entity, SchemaKind::Plain, catalog);

        let mut unique: Vec<(&Schema, &str)> = Vec::new();
        for (scope, attr) in entity.scoped_attrs() {
            let Some(schema) = allowed.lookup(&scope, attr.schema.as_str()) else {
                debug!(schema = %attr.schema, scope = %scope, "Attribute outside resolved scope");
                return Err(ScopeError::SchemaViolation {
                    any_type: entity.any_type.clone(),
                    schema: attr.schema.clone(),
                    scope,
                });
            };
            if schema.unique_constraint {
                unique.extend(attr.values.iter().map(|v| (schema, v.as_str())));
            }
        }

        for (schema, value) in unique {
            if index.exists(entity.id, schema, value).await? {
                return Err(ScopeError::DuplicateValue {
                    schema: schema.key.clone(),
                    value: value.to_string(),
                });
            }
        }

        Ok(allowed)
    }
}

fn extension_applies(entity: &Entity, extension: &GroupTypeExtension) -> bool {
    match entity.kind {
        EntityKind::User => true,
        EntityKind::AnyObject => extension.applies_to(&entity.any_type),
        EntityKind::Group => false,
    }
}
