//! External change notifications.

use std::fmt;

use idmesh_connector::operation::{AttributeValue, ExternalObject, Uid};
use serde::{Deserialize, Serialize};

/// Type of an external change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// New object created.
    Create,
    /// Existing object updated.
    Update,
    /// Object deleted.
    Delete,
}

impl ChangeType {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Update => "update",
            ChangeType::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A change observed on a resource by a pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncDelta {
    pub change_type: ChangeType,
    /// Uid of the changed object.
    pub uid: Uid,
    pub object_class: String,
    /// Object state after the change; for deletes, whatever the connector
    /// still reports.
    pub object: ExternalObject,
}

impl SyncDelta {
    /// Create a delta carrying `object`, with its uid and object class.
    pub fn new(change_type: ChangeType, object: ExternalObject) -> Self {
        Self {
            change_type,
            uid: object.uid.clone(),
            object_class: object.object_class.clone(),
            object,
        }
    }

    /// Attribute of the changed object.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.object.attributes.get(name)
    }

    /// First value of an attribute, rendered as a string.
    ///
    /// The uid is answered for its own attribute name too, since connectors
    /// may not repeat it among the attributes.
    pub fn first_value(&self, name: &str) -> Option<String> {
        self.attribute(name)
            .and_then(AttributeValue::first_value)
            .or_else(|| (name == self.uid.attribute_name()).then(|| self.uid.value().to_string()))
    }
}
