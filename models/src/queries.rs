// models/src/queries.rs
//! Request shapes accepted by the edge store, and the descriptor they are
//! normalized into before compilation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::{NodeId, PropertyName};
use crate::properties::{PropertyMap, PropertyValue};

/// Which properties a read or a removal applies to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertySelector {
    All,
    Named(BTreeSet<PropertyName>),
}

impl PropertySelector {
    /// Selects the given property names.
    ///
    /// # Errors
    /// Fails on the first invalid name.
    pub fn named<I, S>(names: I) -> ValidationResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| PropertyName::new(name.as_ref()))
            .collect::<ValidationResult<BTreeSet<_>>>()
            .map(PropertySelector::Named)
    }
}

/// A comparison operator inside a match expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq(PropertyValue),
    Ne(PropertyValue),
    Gt(PropertyValue),
    Gte(PropertyValue),
    Lt(PropertyValue),
    Lte(PropertyValue),
    In(Vec<PropertyValue>),
    Nin(Vec<PropertyValue>),
    Exists(bool),
}

impl Operator {
    fn from_keyword(keyword: &str, operand: Json) -> ValidationResult<Self> {
        let list = |operand: Json| match operand {
            Json::Array(items) => Ok(items.into_iter().map(PropertyValue::from).collect()),
            _ => Err(ValidationError::InvalidMatchExpression(format!("{keyword} expects an array"))),
        };
        Ok(match keyword {
            "$eq" => Operator::Eq(operand.into()),
            "$ne" => Operator::Ne(operand.into()),
            "$gt" => Operator::Gt(operand.into()),
            "$gte" => Operator::Gte(operand.into()),
            "$lt" => Operator::Lt(operand.into()),
            "$lte" => Operator::Lte(operand.into()),
            "$in" => Operator::In(list(operand)?),
            "$nin" => Operator::Nin(list(operand)?),
            "$exists" => match operand {
                Json::Bool(flag) => Operator::Exists(flag),
                _ => {
                    return Err(ValidationError::InvalidMatchExpression(
                        "$exists expects a boolean".to_string(),
                    ))
                }
            },
            other => {
                return Err(ValidationError::InvalidMatchExpression(format!(
                    "unknown operator {other}"
                )))
            }
        })
    }
}

/// Condition on a single field. A bare value means equality; operator
/// lists are evaluated conjunctively by the storage engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchExpr {
    Value(PropertyValue),
    Ops(Vec<Operator>),
}

impl MatchExpr {
    pub fn equals(value: impl Into<PropertyValue>) -> Self {
        MatchExpr::Value(value.into())
    }

    pub fn not_equals(value: impl Into<PropertyValue>) -> Self {
        MatchExpr::Ops(vec![Operator::Ne(value.into())])
    }
}

impl From<PropertyValue> for MatchExpr {
    fn from(value: PropertyValue) -> Self {
        MatchExpr::Value(value)
    }
}

impl From<Operator> for MatchExpr {
    fn from(op: Operator) -> Self {
        MatchExpr::Ops(vec![op])
    }
}

impl TryFrom<Json> for MatchExpr {
    type Error = ValidationError;

    /// `{"$ne": true}` becomes an operator list and an object of ordinary
    /// keys is matched literally. Mixing both kinds of key is rejected.
    fn try_from(value: Json) -> ValidationResult<Self> {
        match value {
            Json::Object(fields) if fields.keys().any(|k| k.starts_with('$')) => {
                if let Some(plain) = fields.keys().find(|k| !k.starts_with('$')) {
                    return Err(ValidationError::InvalidMatchExpression(format!(
                        "cannot mix operators with the field {plain}"
                    )));
                }
                fields
                    .into_iter()
                    .map(|(keyword, operand)| Operator::from_keyword(&keyword, operand))
                    .collect::<ValidationResult<Vec<_>>>()
                    .map(MatchExpr::Ops)
            }
            other => Ok(MatchExpr::Value(other.into())),
        }
    }
}

/// Property conditions of a search, keyed by property name.
pub type FindConditions = BTreeMap<PropertyName, MatchExpr>;

/// Parses a JSON object of `{property: condition}` pairs.
///
/// # Errors
/// Fails if `value` is not an object, a key is not a valid property name, or
/// a condition uses an unknown operator.
pub fn find_conditions(value: Json) -> ValidationResult<FindConditions> {
    let Json::Object(fields) = value else {
        return Err(ValidationError::InvalidMatchExpression(
            "find conditions must be an object".to_string(),
        ));
    };
    fields
        .into_iter()
        .map(|(key, condition)| -> ValidationResult<_> {
            Ok((PropertyName::new(key)?, MatchExpr::try_from(condition)?))
        })
        .collect()
}

/// Normalized request handed to the compiler. Every field is optional; the
/// compiler branches on presence alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeDescriptor {
    pub src: Option<NodeId>,
    pub dest: Option<NodeId>,
    /// Present only for multi-edge searches.
    pub find: Option<FindConditions>,
    pub get: Option<PropertySelector>,
    pub set: Option<BTreeMap<PropertyName, PropertyValue>>,
    pub remove: Option<PropertySelector>,
}

impl EdgeDescriptor {
    /// Descriptor addressing exactly the edge `src -> dest`.
    pub fn single(src: NodeId, dest: NodeId) -> Self {
        Self {
            src: Some(src),
            dest: Some(dest),
            ..Self::default()
        }
    }
}

/// Input of `set_properties`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeProperties {
    pub src: NodeId,
    pub dest: NodeId,
    pub props: PropertyMap,
}

impl EdgeProperties {
    pub fn new(src: NodeId, dest: NodeId) -> Self {
        Self { src, dest, props: PropertyMap::new() }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}

/// Input of `get_properties` and `remove_properties`. `props: None` means
/// every property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeSelection {
    pub src: NodeId,
    pub dest: NodeId,
    pub props: Option<PropertySelector>,
}

impl EdgeSelection {
    pub fn all(src: NodeId, dest: NodeId) -> Self {
        Self { src, dest, props: None }
    }

    pub fn named<I, S>(src: NodeId, dest: NodeId, names: I) -> ValidationResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            src,
            dest,
            props: Some(PropertySelector::named(names)?),
        })
    }
}

/// Input of `find_edges`. At least one of `src`, `dest`, `find` has to be
/// present for the search to touch storage at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeQuery {
    pub src: Option<NodeId>,
    pub dest: Option<NodeId>,
    pub props: Option<PropertySelector>,
    pub find: Option<FindConditions>,
}

impl EdgeQuery {
    pub fn from_src(src: NodeId) -> Self {
        Self { src: Some(src), ..Self::default() }
    }

    pub fn to_dest(dest: NodeId) -> Self {
        Self { dest: Some(dest), ..Self::default() }
    }

    pub fn matching(find: FindConditions) -> Self {
        Self { find: Some(find), ..Self::default() }
    }

    /// True when the query names at least one predicate.
    pub fn is_plausible(&self) -> bool {
        self.src.is_some() || self.dest.is_some() || self.find.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operator_document_becomes_operator_list() {
        let expr = MatchExpr::try_from(json!({"$ne": true})).unwrap();
        assert_eq!(expr, MatchExpr::Ops(vec![Operator::Ne(PropertyValue::Boolean(true))]));
    }

    #[test]
    fn plain_object_is_matched_literally() {
        let expr = MatchExpr::try_from(json!({"since": 2014})).unwrap();
        assert!(matches!(expr, MatchExpr::Value(PropertyValue::Map(_))));
    }

    #[test]
    fn operators_mixed_with_fields_are_rejected() {
        let err = MatchExpr::try_from(json!({"$exists": true, "x": 2})).unwrap_err();
        assert_eq!(err, ValidationError::InvalidMatchExpression("cannot mix operators with the field x".to_string()));
        assert!(find_conditions(json!({"friend": {"$ne": true, "since": 1}})).is_err());
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = MatchExpr::try_from(json!({"$regex": "a.*"})).unwrap_err();
        assert_eq!(err, ValidationError::InvalidMatchExpression("unknown operator $regex".to_string()));
        assert!(MatchExpr::try_from(json!({"$in": 3})).is_err());
    }

    #[test]
    fn find_conditions_parse_names_and_expressions() {
        let find = find_conditions(json!({"friend": {"$ne": true}, "meta.since": 2014})).unwrap();
        assert_eq!(find.len(), 2);
        assert_eq!(
            find[&PropertyName::new("meta.since").unwrap()],
            MatchExpr::Value(PropertyValue::Integer(2014))
        );
        assert!(find_conditions(json!([1, 2])).is_err());
        assert!(find_conditions(json!({"$bad": 1})).is_err());
    }

    #[test]
    fn query_without_predicates_is_not_plausible() {
        let query = EdgeQuery {
            props: Some(PropertySelector::All),
            ..EdgeQuery::default()
        };
        assert!(!query.is_plausible());
        assert!(EdgeQuery::from_src(NodeId::new_v4()).is_plausible());
        assert!(EdgeQuery::matching(FindConditions::new()).is_plausible());
    }
}
