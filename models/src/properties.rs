// models/src/properties.rs
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::PropertyName;

// f64 does not implement `Eq` or `Hash` directly, so equality and hashing go
// through the bit pattern (`NaN == NaN` here, `0.0 != -0.0`).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializableFloat(pub f64);

impl PartialEq for SerializableFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for SerializableFloat {}

impl Hash for SerializableFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Value stored under a property name. Maps nest recursively, so an edge can
/// carry arbitrary structured data.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(SerializableFloat),
    String(String),
    Array(Vec<PropertyValue>),
    Map(PropertyMap),
    Null,
}

/// Property name (one path segment) to value.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

impl From<String> for PropertyValue { fn from(s: String) -> Self { PropertyValue::String(s) } }
impl From<&str> for PropertyValue { fn from(s: &str) -> Self { PropertyValue::String(s.to_string()) } }
impl From<i64> for PropertyValue { fn from(i: i64) -> Self { PropertyValue::Integer(i) } }
impl From<f64> for PropertyValue { fn from(f: f64) -> Self { PropertyValue::Float(SerializableFloat(f)) } }
impl From<bool> for PropertyValue { fn from(b: bool) -> Self { PropertyValue::Boolean(b) } }
impl From<PropertyMap> for PropertyValue { fn from(m: PropertyMap) -> Self { PropertyValue::Map(m) } }
impl From<Vec<PropertyValue>> for PropertyValue { fn from(v: Vec<PropertyValue>) -> Self { PropertyValue::Array(v) } }

impl From<Json> for PropertyValue {
    fn from(value: Json) -> Self {
        match value {
            Json::Null => PropertyValue::Null,
            Json::Bool(b) => PropertyValue::Boolean(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => PropertyValue::Integer(i),
                // u64 beyond i64::MAX and real floats both land here
                None => PropertyValue::Float(SerializableFloat(n.as_f64().unwrap_or(f64::NAN))),
            },
            Json::String(s) => PropertyValue::String(s),
            Json::Array(items) => PropertyValue::Array(items.into_iter().map(PropertyValue::from).collect()),
            Json::Object(fields) => PropertyValue::Map(
                fields.into_iter().map(|(k, v)| (k, PropertyValue::from(v))).collect(),
            ),
        }
    }
}

impl From<PropertyValue> for Json {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Null => Json::Null,
            PropertyValue::Boolean(b) => Json::Bool(b),
            PropertyValue::Integer(i) => Json::from(i),
            PropertyValue::Float(f) => serde_json::Number::from_f64(f.0).map(Json::Number).unwrap_or(Json::Null),
            PropertyValue::String(s) => Json::String(s),
            PropertyValue::Array(items) => Json::Array(items.into_iter().map(Json::from).collect()),
            PropertyValue::Map(fields) => Json::Object(
                fields.into_iter().map(|(k, v)| (k, Json::from(v))).collect(),
            ),
        }
    }
}

impl PropertyValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(f.0),
            _ => None,
        }
    }

    /// Ordering used by range operators. Numbers compare across integer and
    /// float, strings compare lexically, any other pairing is unordered.
    pub fn compare(&self, other: &PropertyValue) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => Some(a.cmp(b)),
            (PropertyValue::String(a), PropertyValue::String(b)) => Some(a.cmp(b)),
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Equality as seen by a query: `1` and `1.0` are the same number.
    pub fn loosely_equals(&self, other: &PropertyValue) -> bool {
        match (self, other) {
            (PropertyValue::Integer(_), PropertyValue::Float(_))
            | (PropertyValue::Float(_), PropertyValue::Integer(_)) => {
                self.compare(other) == Some(Ordering::Equal)
            }
            _ => self == other,
        }
    }
}

/// Reads the value at a dot-path.
pub fn get_path<'a>(properties: &'a PropertyMap, path: &PropertyName) -> Option<&'a PropertyValue> {
    let mut segments = path.segments();
    let mut current = properties.get(segments.next()?)?;
    for segment in segments {
        match current {
            PropertyValue::Map(inner) => current = inner.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Writes `value` at a dot-path, creating intermediate maps as needed.
/// Sibling properties are left untouched.
///
/// # Errors
/// `ValidationError::PathConflict` when a non-map value sits where an
/// intermediate map is required.
pub fn set_path(properties: &mut PropertyMap, path: &PropertyName, value: PropertyValue) -> ValidationResult<()> {
    let segments: Vec<&str> = path.segments().collect();
    let (leaf, parents) = segments
        .split_last()
        .ok_or_else(|| ValidationError::InvalidPropertyName(path.to_string()))?;

    let mut current = properties;
    for segment in parents {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(|| PropertyValue::Map(PropertyMap::new()));
        current = match slot {
            PropertyValue::Map(inner) => inner,
            _ => return Err(ValidationError::PathConflict(path.to_string())),
        };
    }
    current.insert((*leaf).to_string(), value);
    Ok(())
}

/// Checks that every key nested inside `value` can be addressed as a single
/// path segment: non-empty, without `.` and not starting with `$`.
///
/// # Errors
/// `ValidationError::InvalidPropertyName` naming the offending key.
pub fn validate_nested_keys(value: &PropertyValue) -> ValidationResult<()> {
    match value {
        PropertyValue::Map(fields) => fields.iter().try_for_each(|(key, inner)| {
            if key.is_empty() || key.contains('.') || key.starts_with('$') {
                return Err(ValidationError::InvalidPropertyName(key.clone()));
            }
            validate_nested_keys(inner)
        }),
        PropertyValue::Array(items) => items.iter().try_for_each(validate_nested_keys),
        _ => Ok(()),
    }
}

/// Removes the value at a dot-path. Returns whether anything was removed.
pub fn unset_path(properties: &mut PropertyMap, path: &PropertyName) -> bool {
    let segments: Vec<&str> = path.segments().collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return false;
    };

    let mut current = properties;
    for segment in parents {
        current = match current.get_mut(*segment) {
            Some(PropertyValue::Map(inner)) => inner,
            _ => return false,
        };
    }
    current.remove(*leaf).is_some()
}
