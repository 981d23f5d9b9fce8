//! Schema catalog contract and an in-memory implementation.

use std::collections::HashMap;

use idmesh_core::{
    AnyType, AnyTypeKey, Entity, EntityId, GroupTypeExtension, RelationshipTypeExtension,
    RelationshipTypeKey, Schema, SchemaKind, TypeClass, TypeClassKey,
};

/// Read-only lookup of type classes, schemas and type extensions.
///
/// Implementations must answer from already-loaded state; scope resolution
/// calls them synchronously and never expects lazy loading behind them.
pub trait SchemaCatalog: Send + Sync {
    /// Type classes owned outright by the entity's any type.
    fn classes_of(&self, entity: &Entity) -> Vec<TypeClassKey>;

    /// Schemas of the given kind belonging to a type class.
    fn schemas_of(&self, class: &TypeClassKey, kind: SchemaKind) -> Vec<Schema>;

    /// Type extensions declared on a group.
    fn group_extensions_of(&self, group: EntityId) -> Vec<GroupTypeExtension>;

    /// Type extensions declared on a relationship type.
    fn relationship_extensions_of(
        &self,
        relationship_type: &RelationshipTypeKey,
    ) -> Vec<RelationshipTypeExtension>;
}

/// Catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaCatalog {
    any_types: HashMap<AnyTypeKey, AnyType>,
    classes: HashMap<TypeClassKey, TypeClass>,
    group_extensions: HashMap<EntityId, Vec<GroupTypeExtension>>,
    relationship_extensions: HashMap<RelationshipTypeKey, Vec<RelationshipTypeExtension>>,
}

impl InMemorySchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an any type.
    #[must_use]
    pub fn with_any_type(mut self, any_type: AnyType) -> Self {
        self.any_types.insert(any_type.key.clone(), any_type);
        self
    }

    /// Register a type class.
    #[must_use]
    pub fn with_class(mut self, class: TypeClass) -> Self {
        self.classes.insert(class.key.clone(), class);
        self
    }

    /// Register a group type extension.
    #[must_use]
    pub fn with_group_extension(mut self, extension: GroupTypeExtension) -> Self {
        self.group_extensions
            .entry(extension.group)
            .or_default()
            .push(extension);
        self
    }

    /// Register a relationship type extension.
    #[must_use]
    pub fn with_relationship_extension(mut self, extension: RelationshipTypeExtension) -> Self {
        self.relationship_extensions
            .entry(extension.relationship_type.clone())
            .or_default()
            .push(extension);
        self
    }

    /// Look up an any type.
    pub fn any_type(&self, key: &AnyTypeKey) -> Option<&AnyType> {
        self.any_types.get(key)
    }
}

impl SchemaCatalog for InMemorySchemaCatalog {
    fn classes_of(&self, entity: &Entity) -> Vec<TypeClassKey> {
        self.any_types
            .get(&entity.any_type)
            .map(|t| t.classes.clone())
            .unwrap_or_default()
    }

    fn schemas_of(&self, class: &TypeClassKey, kind: SchemaKind) -> Vec<Schema> {
        self.classes
            .get(class)
            .map(|c| c.schemas_of(kind).cloned().collect())
            .unwrap_or_default()
    }

    fn group_extensions_of(&self, group: EntityId) -> Vec<GroupTypeExtension> {
        self.group_extensions
            .get(&group)
            .cloned()
            .unwrap_or_default()
    }

    fn relationship_extensions_of(
        &self,
        relationship_type: &RelationshipTypeKey,
    ) -> Vec<RelationshipTypeExtension> {
        self.relationship_extensions
            .get(relationship_type)
            .cloned()
            .unwrap_or_default()
    }
}
