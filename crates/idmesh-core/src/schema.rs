//! Schema model: schemas, type classes, any types and type extensions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::EntityKind;
use crate::ids::{AnyTypeKey, EntityId, RelationshipTypeKey, SchemaKey, TypeClassKey};

/// Flavor of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Stored attribute.
    Plain,
    /// Computed from other attributes.
    Derived,
    /// Read live from a resource.
    Virtual,
}

impl SchemaKind {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Plain => "plain",
            SchemaKind::Derived => "derived",
            SchemaKind::Virtual => "virtual",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value type of a schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValueType {
    #[default]
    String,
    Long,
    Double,
    Boolean,
    Date,
    Enum,
    Encrypted,
    Binary,
}

/// An attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Unique key.
    pub key: SchemaKey,
    /// Plain, derived or virtual.
    pub kind: SchemaKind,
    /// Value type.
    #[serde(default)]
    pub value_type: AttrValueType,
    /// Whether a value may be held by at most one entity.
    #[serde(default)]
    pub unique_constraint: bool,
    /// Whether more than one value is allowed.
    #[serde(default)]
    pub multivalue: bool,
}

impl Schema {
    /// Create a plain string schema.
    pub fn plain(key: impl Into<SchemaKey>) -> Self {
        Self::of_kind(key, SchemaKind::Plain)
    }

    /// Create a derived schema.
    pub fn derived(key: impl Into<SchemaKey>) -> Self {
        Self::of_kind(key, SchemaKind::Derived)
    }

    /// Create a virtual schema.
    pub fn virtual_schema(key: impl Into<SchemaKey>) -> Self {
        Self::of_kind(key, SchemaKind::Virtual)
    }

    fn of_kind(key: impl Into<SchemaKey>, kind: SchemaKind) -> Self {
        Self {
            key: key.into(),
            kind,
            value_type: AttrValueType::String,
            unique_constraint: false,
            multivalue: false,
        }
    }

    /// Mark the schema as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique_constraint = true;
        self
    }

    /// Mark the schema as multivalued.
    #[must_use]
    pub fn multivalued(mut self) -> Self {
        self.multivalue = true;
        self
    }

    /// Set the value type.
    #[must_use]
    pub fn with_value_type(mut self, value_type: AttrValueType) -> Self {
        self.value_type = value_type;
        self
    }
}

/// A reusable bundle of schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeClass {
    /// Type class key.
    pub key: TypeClassKey,
    /// Schemas of every kind owned by this class.
    #[serde(default)]
    pub schemas: Vec<Schema>,
}

impl TypeClass {
    /// Create an empty type class.
    pub fn new(key: impl Into<TypeClassKey>) -> Self {
        Self {
            key: key.into(),
            schemas: Vec::new(),
        }
    }

    /// Add a schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Schemas of the given kind.
    pub fn schemas_of(&self, kind: SchemaKind) -> impl Iterator<Item = &Schema> {
        self.schemas.iter().filter(move |s| s.kind == kind)
    }
}

/// An entity type: its kind and the type classes it owns outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyType {
    /// Any type key.
    pub key: AnyTypeKey,
    /// Kind of the entities of this type.
    pub kind: EntityKind,
    /// Type classes owned by this type.
    #[serde(default)]
    pub classes: Vec<TypeClassKey>,
}

impl AnyType {
    /// Create an any type without classes.
    pub fn new(key: impl Into<AnyTypeKey>, kind: EntityKind) -> Self {
        Self {
            key: key.into(),
            kind,
            classes: Vec::new(),
        }
    }

    /// Add an owned type class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<TypeClassKey>) -> Self {
        self.classes.push(class.into());
        self
    }
}

/// Grants extra type classes to members of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTypeExtension {
    /// Group declaring the extension.
    pub group: EntityId,
    /// Any type of the members the extension applies to.
    pub any_type: AnyTypeKey,
    /// Type classes granted.
    #[serde(default)]
    pub aux_classes: Vec<TypeClassKey>,
}

impl GroupTypeExtension {
    /// Create an extension on `group` for members of `any_type`.
    pub fn new(group: EntityId, any_type: impl Into<AnyTypeKey>) -> Self {
        Self {
            group,
            any_type: any_type.into(),
            aux_classes: Vec::new(),
        }
    }

    /// Add a granted type class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<TypeClassKey>) -> Self {
        self.aux_classes.push(class.into());
        self
    }

    /// Whether this extension applies to members of the given type.
    #[must_use]
    pub fn applies_to(&self, any_type: &AnyTypeKey) -> bool {
        &self.any_type == any_type
    }
}

/// Grants extra type classes to participants of a relationship type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipTypeExtension {
    /// Relationship type declaring the extension.
    pub relationship_type: RelationshipTypeKey,
    /// Type classes granted.
    #[serde(default)]
    pub aux_classes: Vec<TypeClassKey>,
}

impl RelationshipTypeExtension {
    /// Create an extension on the given relationship type.
    pub fn new(relationship_type: impl Into<RelationshipTypeKey>) -> Self {
        Self {
            relationship_type: relationship_type.into(),
            aux_classes: Vec::new(),
        }
    }

    /// Add a granted type class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<TypeClassKey>) -> Self {
        self.aux_classes.push(class.into());
        self
    }
}
