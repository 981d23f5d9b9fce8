//! Connector operation types
//!
//! UIDs, attribute sets and external objects, plus the operational
//! attribute names every connector understands.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Operational attribute carrying the external unique identifier.
pub const UID_NAME: &str = "__UID__";

/// Operational attribute carrying the external naming attribute.
pub const NAME_NAME: &str = "__NAME__";

/// Operational attribute carrying the password.
pub const PASSWORD_NAME: &str = "__PASSWORD__";

/// Operational attribute carrying the enabled/disabled state.
pub const ENABLE_NAME: &str = "__ENABLE__";

/// Unique identifier for an object on an external resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid {
    /// The attribute name used as the identifier.
    attribute_name: String,
    /// The actual value of the identifier.
    value: String,
}

impl Uid {
    /// Create a new UID with the given attribute name and value.
    pub fn new(attribute_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            value: value.into(),
        }
    }

    /// Create a UID named by the `__UID__` operational attribute.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self::new(UID_NAME, value)
    }

    /// Get the attribute name.
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// Get the value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.attribute_name, self.value)
    }
}

/// A set of named attributes, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    #[serde(flatten)]
    attributes: BTreeMap<String, AttributeValue>,
}

impl AttributeSet {
    /// Create a new empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Set an attribute using builder pattern.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Get a single-valued string attribute.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_string())
    }

    /// Check if an attribute exists.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Remove an attribute.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    /// Get all attribute names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate over all attributes.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.attributes.iter()
    }

    /// Normalise every attribute to a set of strings.
    ///
    /// Attributes named in `excluded` are left out.
    pub fn normalized(&self, excluded: &[String]) -> BTreeMap<String, BTreeSet<String>> {
        self.attributes
            .iter()
            .filter(|(name, _)| !excluded.iter().any(|e| e == *name))
            .map(|(name, value)| (name.clone(), value.normalized()))
            .collect()
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

/// A value for an attribute, which may be single or multi-valued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// No value (null).
    Null,
    /// A single string value.
    String(String),
    /// A single integer value.
    Integer(i64),
    /// A single boolean value.
    Boolean(bool),
    /// A single floating-point value.
    Float(f64),
    /// Binary data, serialized as `{"$binary": "<base64>"}`.
    Binary(#[serde(with = "binary_serde")] Vec<u8>),
    /// Multiple values.
    Array(Vec<AttributeValue>),
    /// JSON object value.
    Object(serde_json::Map<String, Value>),
}

/// Keeps binary values distinct from arrays of small integers on the wire.
mod binary_serde {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::de;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Encoded {
        #[serde(rename = "$binary")]
        binary: String,
    }

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Encoded {
            binary: STANDARD.encode(value),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = Encoded::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.binary.as_bytes())
            .map_err(|e| de::Error::custom(format!("invalid base64 in $binary: {e}")))
    }
}

impl AttributeValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Get as a string if this is a single string value.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as strings (works for both single and multi-valued).
    pub fn as_strings(&self) -> Vec<&str> {
        match self {
            AttributeValue::String(s) => vec![s.as_str()],
            AttributeValue::Array(arr) => arr.iter().filter_map(|v| v.as_string()).collect(),
            _ => vec![],
        }
    }

    /// First value rendered as a string, if any.
    pub fn first_value(&self) -> Option<String> {
        self.normalized_values().into_iter().next()
    }

    /// Collect the value into an unordered set of strings.
    ///
    /// Binary values are base64 encoded, nulls are dropped and arrays are
    /// flattened, so duplicate values collapse.
    pub fn normalized(&self) -> BTreeSet<String> {
        self.normalized_values().into_iter().collect()
    }

    fn normalized_values(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.push_normalized(&mut out);
        out
    }

    fn push_normalized(&self, out: &mut Vec<String>) {
        match self {
            AttributeValue::Null => {}
            AttributeValue::String(s) => out.push(s.clone()),
            AttributeValue::Integer(i) => out.push(i.to_string()),
            AttributeValue::Boolean(b) => out.push(b.to_string()),
            AttributeValue::Float(f) => out.push(f.to_string()),
            AttributeValue::Binary(bytes) => out.push(STANDARD.encode(bytes)),
            AttributeValue::Array(values) => {
                for value in values {
                    value.push_normalized(out);
                }
            }
            AttributeValue::Object(map) => out.push(Value::Object(map.clone()).to_string()),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Float(f)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(bytes: Vec<u8>) -> Self {
        AttributeValue::Binary(bytes)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(vec: Vec<T>) -> Self {
        AttributeValue::Array(vec.into_iter().map(Into::into).collect())
    }
}

/// The connector's view of a record on an external resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalObject {
    /// Object class the record belongs to.
    pub object_class: String,
    /// External unique identifier.
    pub uid: Uid,
    /// Attributes returned by the connector.
    #[serde(default)]
    pub attributes: AttributeSet,
}

impl ExternalObject {
    /// Create an external object without attributes.
    pub fn new(object_class: impl Into<String>, uid: Uid) -> Self {
        Self {
            object_class: object_class.into(),
            uid,
            attributes: AttributeSet::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.set(name, value);
        self
    }

    /// Normalised attributes, with the uid exposed under `__UID__`.
    pub fn normalized_attributes(&self, excluded: &[String]) -> BTreeMap<String, BTreeSet<String>> {
        let mut attrs = self.attributes.normalized(excluded);
        if !excluded.iter().any(|e| e == UID_NAME) {
            attrs
                .entry(UID_NAME.to_string())
                .or_default()
                .insert(self.uid.value().to_string());
        }
        attrs
    }
}
