//! Resource mapping types.
//!
//! An [`ExternalResource`] carries one [`Provision`] per any type it manages.
//! Each provision binds the any type to an external object class through an
//! ordered [`Mapping`] of internal/external attribute pairs.

use idmesh_core::{AnyTypeKey, ResourceKey};
use serde::{Deserialize, Serialize};

use crate::operation::PASSWORD_NAME;

/// Direction(s) in which a mapping item is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingPurpose {
    /// Push only.
    Propagation,
    /// Pull only.
    Pull,
    /// Push and pull.
    #[default]
    Both,
    /// Disabled.
    None,
}

impl MappingPurpose {
    /// Whether items with this purpose are written to the resource.
    pub fn includes_propagation(self) -> bool {
        matches!(self, Self::Propagation | Self::Both)
    }

    /// Whether items with this purpose are read back from the resource.
    pub fn includes_pull(self) -> bool {
        matches!(self, Self::Pull | Self::Both)
    }
}

/// A single internal/external attribute pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingItem {
    /// Internal attribute (schema key or field name such as `username`).
    pub int_attr_name: String,

    /// External attribute name on the resource.
    pub ext_attr_name: String,

    /// Whether this item carries the external key.
    #[serde(default)]
    pub conn_object_key: bool,

    /// Whether this item carries the password.
    #[serde(default)]
    pub password: bool,

    /// Direction(s) this item is used in.
    #[serde(default)]
    pub purpose: MappingPurpose,
}

impl MappingItem {
    /// Create a bidirectional item.
    pub fn new(int_attr_name: impl Into<String>, ext_attr_name: impl Into<String>) -> Self {
        Self {
            int_attr_name: int_attr_name.into(),
            ext_attr_name: ext_attr_name.into(),
            conn_object_key: false,
            password: false,
            purpose: MappingPurpose::Both,
        }
    }

    /// Create the external key item.
    pub fn key(int_attr_name: impl Into<String>, ext_attr_name: impl Into<String>) -> Self {
        Self {
            conn_object_key: true,
            ..Self::new(int_attr_name, ext_attr_name)
        }
    }

    /// Create the password item.
    pub fn password() -> Self {
        Self {
            password: true,
            ..Self::new("password", PASSWORD_NAME)
        }
    }

    /// Set the purpose.
    #[must_use]
    pub fn with_purpose(mut self, purpose: MappingPurpose) -> Self {
        self.purpose = purpose;
        self
    }

    /// Whether the item takes part in propagation.
    pub fn is_propagated(&self) -> bool {
        self.purpose.includes_propagation()
    }

    /// Whether the item takes part in pull.
    pub fn is_pulled(&self) -> bool {
        self.purpose.includes_pull()
    }
}

/// Ordered list of mapping items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// Items in declaration order.
    #[serde(default)]
    pub items: Vec<MappingItem>,
}

impl Mapping {
    /// Create a mapping from items.
    pub fn new(items: Vec<MappingItem>) -> Self {
        Self { items }
    }

    /// The item flagged as external key, if any.
    pub fn conn_object_key_item(&self) -> Option<&MappingItem> {
        self.items.iter().find(|item| item.conn_object_key)
    }

    /// First pull item mapping the given internal attribute.
    pub fn pull_item_for_internal(&self, int_attr_name: &str) -> Option<&MappingItem> {
        self.items
            .iter()
            .find(|item| item.is_pulled() && item.int_attr_name == int_attr_name)
    }

    /// Items written to the resource on propagation, in mapping order.
    pub fn propagation_items(&self) -> impl Iterator<Item = &MappingItem> {
        self.items.iter().filter(|item| item.is_propagated())
    }

    /// External names of all propagated non-password items, deduplicated in
    /// mapping order.
    pub fn attributes_to_get(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.items.len());
        for item in self.propagation_items().filter(|item| !item.password) {
            if !names.contains(&item.ext_attr_name) {
                names.push(item.ext_attr_name.clone());
            }
        }
        names
    }
}

/// Binding of an any type to an external object class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provision {
    /// Any type this provision applies to.
    pub any_type: AnyTypeKey,

    /// External object class (e.g. `__ACCOUNT__`).
    pub object_class: String,

    /// Attribute mapping, absent when the provision only declares the class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Mapping>,

    /// Whether key matching on the resource ignores case.
    #[serde(default)]
    pub ignore_case_match: bool,
}

impl Provision {
    /// Create a provision without mapping.
    pub fn new(any_type: impl Into<AnyTypeKey>, object_class: impl Into<String>) -> Self {
        Self {
            any_type: any_type.into(),
            object_class: object_class.into(),
            mapping: None,
            ignore_case_match: false,
        }
    }

    /// Set the mapping.
    #[must_use]
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Match external keys without regard to case.
    #[must_use]
    pub fn ignoring_case(mut self) -> Self {
        self.ignore_case_match = true;
        self
    }

    /// The external key item, when a mapping declares one.
    pub fn conn_object_key_item(&self) -> Option<&MappingItem> {
        self.mapping.as_ref().and_then(Mapping::conn_object_key_item)
    }
}

/// An external system reachable through a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalResource {
    /// Resource key.
    pub key: ResourceKey,

    /// One provision per managed any type.
    #[serde(default)]
    pub provisions: Vec<Provision>,
}

impl ExternalResource {
    /// Create a resource without provisions.
    pub fn new(key: impl Into<ResourceKey>) -> Self {
        Self {
            key: key.into(),
            provisions: Vec::new(),
        }
    }

    /// Add a provision.
    #[must_use]
    pub fn with_provision(mut self, provision: Provision) -> Self {
        self.provisions.push(provision);
        self
    }

    /// The provision for the given any type.
    pub fn provision(&self, any_type: &AnyTypeKey) -> Option<&Provision> {
        self.provisions.iter().find(|p| &p.any_type == any_type)
    }
}
