//! Strongly Typed Identifiers
//!
//! Entities are addressed by random UUIDs. Everything administered through
//! configuration (any types, type classes, schemas, relationship types,
//! resources) is addressed by a human-readable string key instead.
//!
//! # Example
//!
//! ```
//! use idmesh_core::{EntityId, SchemaKey};
//!
//! let bob = EntityId::new();
//! let badge = SchemaKey::new("badge");
//!
//! // Type safety: a SchemaKey cannot be passed where a TypeClassKey is expected
//! fn requires_entity(id: EntityId) -> String {
//!     id.to_string()
//! }
//!
//! assert_eq!(requires_entity(bob).len(), 36);
//! assert_eq!(badge.as_str(), "badge");
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a UUID-backed ID type
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

/// Macro to define a string-keyed identifier
macro_rules! define_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a key from any string-like value.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Returns the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                if s.trim().is_empty() {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        message: "key must not be blank".to_string(),
                    });
                }
                Ok(Self(s.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of a managed entity (user, group or any object).
    ///
    /// Memberships and relationships refer to their other end by this id
    /// rather than holding the entity itself.
    ///
    /// ```
    /// use idmesh_core::EntityId;
    /// use uuid::Uuid;
    ///
    /// let uuid = Uuid::new_v4();
    /// let id = EntityId::from_uuid(uuid);
    /// assert_eq!(id.as_uuid(), &uuid);
    /// ```
    EntityId
);

define_id!(
    /// Identifier of an account linked under a user on a specific resource.
    LinkedAccountId
);

define_key!(
    /// Key of an any type (`USER`, `GROUP`, `PRINTER`, ...).
    AnyTypeKey
);

define_key!(
    /// Key of a type class, a reusable bundle of schemas.
    TypeClassKey
);

define_key!(
    /// Key of a schema (attribute definition).
    SchemaKey
);

define_key!(
    /// Key of a relationship type.
    RelationshipTypeKey
);

define_key!(
    /// Key of an external resource.
    ResourceKey
);
