// models/src/identifiers.rs

use core::ops::Deref;
use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use internment::Intern;
use uuid::Uuid;

use crate::errors::{ValidationError, ValidationResult};

/// Opaque, fixed-size identifier of an edge endpoint (a graph node).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Generates a fresh random identifier.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for NodeId {
    fn from(value: Uuid) -> Self {
        NodeId(value)
    }
}

impl From<NodeId> for Uuid {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

impl FromStr for NodeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        Uuid::parse_str(s)
            .map(NodeId)
            .map_err(|_| ValidationError::InvalidNodeId(s.to_string()))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Name of an edge property. Names are dot-paths (`"meta.since"`) addressing
/// a leaf inside the nested property map.
///
/// A valid name is 1 to 255 bytes long, has no empty segments and no
/// segment starting with `$` (that prefix is reserved for match operators).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyName(Intern<String>);

impl PropertyName {
    /// Creates a new property name.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the value is empty, longer than 255
    /// bytes, or contains an invalid segment.
    pub fn new(value: impl Into<String>) -> ValidationResult<Self> {
        let value = value.into();
        if value.is_empty() || value.len() > u8::MAX as usize {
            return Err(ValidationError::InvalidPropertyNameLength);
        }
        if value.split('.').any(|segment| segment.is_empty() || segment.starts_with('$')) {
            return Err(ValidationError::InvalidPropertyName(value));
        }

        Ok(Self(Intern::new(value)))
    }

    /// The dot-separated segments of this name.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<'de> Deserialize<'de> for PropertyName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PropertyName::new(raw).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for PropertyName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for PropertyName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl FromStr for PropertyName {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for PropertyName {
    type Error = ValidationError;

    fn try_from(value: &str) -> ValidationResult<Self> {
        Self::new(value)
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PropertyName> for String {
    fn from(value: PropertyName) -> Self {
        value.0.to_string()
    }
}

impl PartialOrd for PropertyName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropertyName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.as_str().cmp(other.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeId, PropertyName};
    use crate::errors::ValidationError;
    use core::str::FromStr;

    #[test]
    fn should_not_create_empty_property_name() {
        let name = PropertyName::new("");
        assert_eq!(name.unwrap_err(), ValidationError::InvalidPropertyNameLength);
    }

    #[test]
    fn should_not_create_too_long_property_name() {
        let name = PropertyName::new("a".repeat(256));
        assert_eq!(name.unwrap_err(), ValidationError::InvalidPropertyNameLength);
    }

    #[test]
    fn should_reject_empty_segments_and_operator_prefix() {
        for raw in ["a..b", ".a", "a.", "$ne", "meta.$set"] {
            assert_eq!(
                PropertyName::new(raw).unwrap_err(),
                ValidationError::InvalidPropertyName(raw.to_string()),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn should_split_dot_path_into_segments() {
        let name = PropertyName::from_str("meta.since").unwrap();
        assert_eq!(name.segments().collect::<Vec<_>>(), vec!["meta", "since"]);
        assert_eq!(name.as_str(), "meta.since");
    }

    #[test]
    fn should_order_property_names_lexically() {
        let a = PropertyName::new("alpha").unwrap();
        let b = PropertyName::new("beta").unwrap();
        assert!(a < b);
    }

    #[test]
    fn should_round_trip_node_id_through_display() {
        let id = NodeId::new_v4();
        let parsed = NodeId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
        assert!(NodeId::from_str("not-a-node").is_err());
    }
}
