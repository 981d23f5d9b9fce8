//! Managed entities.
//!
//! An [`Entity`] is a user, a group or an any object. Memberships and
//! relationships are edges that reference the other end by [`EntityId`];
//! callers resolve those ids to loaded entities only where they need them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, Result};
use crate::ids::{
    AnyTypeKey, EntityId, LinkedAccountId, RelationshipTypeKey, ResourceKey, SchemaKey, TypeClassKey,
};

/// Any type key of the built-in user type.
pub const USER_ANY_TYPE: &str = "USER";

/// Any type key of the built-in group type.
pub const GROUP_ANY_TYPE: &str = "GROUP";

/// Closed set of entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// A person or service account.
    User,
    /// A group of users and any objects.
    Group,
    /// Any other managed object (printers, devices, ...).
    AnyObject,
}

/// Which edges an entity kind may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindCapabilities {
    /// Can be a member of groups.
    pub memberships: bool,
    /// Can participate in typed relationships.
    pub relationships: bool,
}

impl EntityKind {
    /// Capability table for this kind.
    #[must_use]
    pub const fn capabilities(self) -> KindCapabilities {
        match self {
            EntityKind::User => KindCapabilities {
                memberships: true,
                relationships: true,
            },
            EntityKind::Group => KindCapabilities {
                memberships: false,
                relationships: false,
            },
            EntityKind::AnyObject => KindCapabilities {
                memberships: true,
                relationships: true,
            },
        }
    }

    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "USER",
            EntityKind::Group => "GROUP",
            EntityKind::AnyObject => "ANY_OBJECT",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(EntityKind::User),
            "GROUP" => Ok(EntityKind::Group),
            "ANY_OBJECT" => Ok(EntityKind::AnyObject),
            _ => Err(format!("Unknown entity kind: {s}")),
        }
    }
}

/// A plain attribute: schema key plus its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainAttr {
    /// Schema this attribute is an instance of.
    pub schema: SchemaKey,
    /// Attribute values, in insertion order.
    #[serde(default)]
    pub values: Vec<String>,
}

impl PlainAttr {
    /// Create a new attribute.
    pub fn new<I, V>(schema: impl Into<SchemaKey>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            schema: schema.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a single-valued attribute.
    pub fn single(schema: impl Into<SchemaKey>, value: impl Into<String>) -> Self {
        Self::new(schema, [value.into()])
    }
}

/// Where an attribute lives on its entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum AttrScope {
    /// Directly on the entity.
    Own,
    /// On the membership of the entity in `group`.
    Membership {
        /// Group at the other end of the membership.
        group: EntityId,
    },
    /// On a relationship of the entity.
    Relationship {
        /// Type of the relationship.
        relationship_type: RelationshipTypeKey,
        /// Entity at the other end of the relationship.
        other_end: EntityId,
    },
}

impl fmt::Display for AttrScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrScope::Own => f.write_str("own"),
            AttrScope::Membership { group } => write!(f, "membership of group {group}"),
            AttrScope::Relationship {
                relationship_type,
                other_end,
            } => write!(f, "relationship {relationship_type} with {other_end}"),
        }
    }
}

/// Membership of an entity in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// The group.
    pub group: EntityId,
    /// Attributes scoped to this membership.
    #[serde(default)]
    pub plain_attrs: Vec<PlainAttr>,
}

impl Membership {
    /// Create a membership without attributes.
    #[must_use]
    pub fn new(group: EntityId) -> Self {
        Self {
            group,
            plain_attrs: Vec::new(),
        }
    }

    /// Add a membership-scoped attribute.
    #[must_use]
    pub fn with_attr(mut self, attr: PlainAttr) -> Self {
        self.plain_attrs.push(attr);
        self
    }
}

/// Typed relationship from an entity to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship type.
    pub relationship_type: RelationshipTypeKey,
    /// The other end.
    pub other_end: EntityId,
    /// Attributes scoped to this relationship.
    #[serde(default)]
    pub plain_attrs: Vec<PlainAttr>,
}

impl Relationship {
    /// Create a relationship without attributes.
    pub fn new(relationship_type: impl Into<RelationshipTypeKey>, other_end: EntityId) -> Self {
        Self {
            relationship_type: relationship_type.into(),
            other_end,
            plain_attrs: Vec::new(),
        }
    }

    /// Add a relationship-scoped attribute.
    #[must_use]
    pub fn with_attr(mut self, attr: PlainAttr) -> Self {
        self.plain_attrs.push(attr);
        self
    }
}

/// Account-level details only users carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetails {
    /// Last successful login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_date: Option<DateTime<Utc>>,
    /// Last password change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_pwd_date: Option<DateTime<Utc>>,
    /// Consecutive failed logins.
    #[serde(default)]
    pub failed_logins: u32,
    /// Number of remembered previous passwords.
    #[serde(default)]
    pub password_history_size: u32,
}

/// An external account linked under a user on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    /// Account ID.
    pub id: LinkedAccountId,
    /// Owning user.
    pub owner: EntityId,
    /// Resource the account lives on.
    pub resource: ResourceKey,
    /// External key value identifying the account on the resource.
    pub conn_object_key_value: String,
    /// Optional username override for the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Account-specific attributes.
    #[serde(default)]
    pub plain_attrs: Vec<PlainAttr>,
}

impl LinkedAccount {
    /// Create a new linked account for `owner` on `resource`.
    pub fn new(
        owner: EntityId,
        resource: impl Into<ResourceKey>,
        conn_object_key_value: impl Into<String>,
    ) -> Self {
        Self {
            id: LinkedAccountId::new(),
            owner,
            resource: resource.into(),
            conn_object_key_value: conn_object_key_value.into(),
            username: None,
            plain_attrs: Vec::new(),
        }
    }
}

/// A managed entity.
///
/// Deserialization replays every edge through [`Entity::add_membership`] and
/// [`Entity::add_relationship`], so stored data obeys the capability table too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntityRepr")]
pub struct Entity {
    /// Entity ID.
    pub id: EntityId,
    /// Kind, drives which edges are allowed.
    pub kind: EntityKind,
    /// Base any type; owns the entity's type classes.
    pub any_type: AnyTypeKey,
    /// Username, group name or any object name.
    pub name: String,
    /// Workflow status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Auxiliary type classes granted ad hoc.
    #[serde(default)]
    pub aux_classes: Vec<TypeClassKey>,
    /// Attributes held directly by the entity.
    #[serde(default)]
    pub plain_attrs: Vec<PlainAttr>,
    #[serde(default)]
    memberships: Vec<Membership>,
    #[serde(default)]
    relationships: Vec<Relationship>,
    /// Resources directly assigned to the entity.
    #[serde(default)]
    pub resources: Vec<ResourceKey>,
    /// When the entity was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    /// User-only account details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_details: Option<UserDetails>,
}

/// Wire shape of [`Entity`], checked on conversion.
#[derive(Deserialize)]
struct EntityRepr {
    id: EntityId,
    kind: EntityKind,
    any_type: AnyTypeKey,
    name: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    aux_classes: Vec<TypeClassKey>,
    #[serde(default)]
    plain_attrs: Vec<PlainAttr>,
    #[serde(default)]
    memberships: Vec<Membership>,
    #[serde(default)]
    relationships: Vec<Relationship>,
    #[serde(default)]
    resources: Vec<ResourceKey>,
    #[serde(default)]
    creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    user_details: Option<UserDetails>,
}

impl TryFrom<EntityRepr> for Entity {
    type Error = ModelError;

    fn try_from(repr: EntityRepr) -> Result<Self> {
        let mut entity = Entity {
            id: repr.id,
            kind: repr.kind,
            any_type: repr.any_type,
            name: repr.name,
            status: repr.status,
            aux_classes: repr.aux_classes,
            plain_attrs: repr.plain_attrs,
            memberships: Vec::new(),
            relationships: Vec::new(),
            resources: repr.resources,
            creation_date: repr.creation_date,
            user_details: repr.user_details,
        };
        for membership in repr.memberships {
            entity.add_membership(membership)?;
        }
        for relationship in repr.relationships {
            entity.add_relationship(relationship)?;
        }
        Ok(entity)
    }
}

impl Entity {
    /// Create a bare entity.
    pub fn new(kind: EntityKind, any_type: impl Into<AnyTypeKey>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            any_type: any_type.into(),
            name: name.into(),
            status: None,
            aux_classes: Vec::new(),
            plain_attrs: Vec::new(),
            memberships: Vec::new(),
            relationships: Vec::new(),
            resources: Vec::new(),
            creation_date: None,
            user_details: None,
        }
    }

    /// Create a user of the built-in `USER` type.
    pub fn user(username: impl Into<String>) -> Self {
        let mut user = Self::new(EntityKind::User, USER_ANY_TYPE, username);
        user.user_details = Some(UserDetails::default());
        user
    }

    /// Create a group of the built-in `GROUP` type.
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Group, GROUP_ANY_TYPE, name)
    }

    /// Create an any object of the given type.
    pub fn any_object(any_type: impl Into<AnyTypeKey>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::AnyObject, any_type, name)
    }

    /// Set a fixed id.
    #[must_use]
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    /// Add an auxiliary type class.
    #[must_use]
    pub fn with_aux_class(mut self, class: impl Into<TypeClassKey>) -> Self {
        self.aux_classes.push(class.into());
        self
    }

    /// Add an attribute held directly by the entity.
    #[must_use]
    pub fn with_attr(mut self, attr: PlainAttr) -> Self {
        self.plain_attrs.push(attr);
        self
    }

    /// Assign a resource.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<ResourceKey>) -> Self {
        self.resources.push(resource.into());
        self
    }

    /// Add a membership, builder style.
    pub fn with_membership(mut self, membership: Membership) -> Result<Self> {
        self.add_membership(membership)?;
        Ok(self)
    }

    /// Add a relationship, builder style.
    pub fn with_relationship(mut self, relationship: Relationship) -> Result<Self> {
        self.add_relationship(relationship)?;
        Ok(self)
    }

    /// Add a membership; fails for kinds that cannot be group members.
    pub fn add_membership(&mut self, membership: Membership) -> Result<()> {
        if !self.kind.capabilities().memberships {
            return Err(ModelError::UnsupportedEdge {
                kind: self.kind,
                edge: "membership",
            });
        }
        if membership.group == self.id {
            return Err(ModelError::validation(
                "membership",
                "an entity cannot be a member of itself",
            ));
        }
        self.memberships.push(membership);
        Ok(())
    }

    /// Add a relationship; fails for kinds that cannot hold relationships.
    pub fn add_relationship(&mut self, relationship: Relationship) -> Result<()> {
        if !self.kind.capabilities().relationships {
            return Err(ModelError::UnsupportedEdge {
                kind: self.kind,
                edge: "relationship",
            });
        }
        self.relationships.push(relationship);
        Ok(())
    }

    /// Memberships, in insertion order.
    #[must_use]
    pub fn memberships(&self) -> &[Membership] {
        &self.memberships
    }

    /// Relationships, in insertion order.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Membership in the given group, if any.
    #[must_use]
    pub fn membership(&self, group: EntityId) -> Option<&Membership> {
        self.memberships.iter().find(|m| m.group == group)
    }

    /// Own attribute for the given schema, if any.
    #[must_use]
    pub fn plain_attr(&self, schema: &str) -> Option<&PlainAttr> {
        self.plain_attrs.iter().find(|a| a.schema.as_str() == schema)
    }

    /// Every plain attribute with its scope: own attributes first, then
    /// membership-scoped in membership order, then relationship-scoped.
    pub fn scoped_attrs(&self) -> impl Iterator<Item = (AttrScope, &PlainAttr)> {
        let own = self.plain_attrs.iter().map(|a| (AttrScope::Own, a));
        let memb = self.memberships.iter().flat_map(|m| {
            m.plain_attrs
                .iter()
                .map(move |a| (AttrScope::Membership { group: m.group }, a))
        });
        let rel = self.relationships.iter().flat_map(|r| {
            r.plain_attrs.iter().map(move |a| {
                (
                    AttrScope::Relationship {
                        relationship_type: r.relationship_type.clone(),
                        other_end: r.other_end,
                    },
                    a,
                )
            })
        });
        own.chain(memb).chain(rel)
    }
}
