// lib/src/storage_engine/document.rs
//! Document semantics shared by every engine: filter evaluation, projection,
//! update application and upsert resolution. Engines only decide where the
//! bytes live.

use models::errors::{GraphError, GraphResult};
use models::properties::{get_path, set_path, unset_path};
use models::{Edge, MatchExpr, Operator, ProjectedEdge, PropertyMap, PropertyValue};

use crate::query_compiler::{Clear, Filter, Projection, Update, UpsertOptions};

/// Whether `edge` satisfies every condition of `filter`.
pub fn matches(edge: &Edge, filter: &Filter) -> bool {
    if filter.src.is_some_and(|src| src != edge.src) {
        return false;
    }
    if filter.dest.is_some_and(|dest| dest != edge.dest) {
        return false;
    }
    if filter.unique_index.as_deref().is_some_and(|key| key != edge.unique_index) {
        return false;
    }
    filter.props.iter().all(|(name, expr)| {
        let value = edge.props.as_ref().and_then(|props| get_path(props, name));
        evaluate(expr, value)
    })
}

/// Evaluates a match expression against a possibly missing field.
pub fn evaluate(expr: &MatchExpr, value: Option<&PropertyValue>) -> bool {
    match expr {
        MatchExpr::Value(expected) => equals(value, expected),
        MatchExpr::Ops(ops) => ops.iter().all(|op| apply_operator(op, value)),
    }
}

fn apply_operator(op: &Operator, value: Option<&PropertyValue>) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};

    match op {
        Operator::Eq(expected) => equals(value, expected),
        Operator::Ne(expected) => !equals(value, expected),
        Operator::Gt(bound) => ordered(value, bound, |o| o == Greater),
        Operator::Gte(bound) => ordered(value, bound, |o| o == Greater || o == Equal),
        Operator::Lt(bound) => ordered(value, bound, |o| o == Less),
        Operator::Lte(bound) => ordered(value, bound, |o| o == Less || o == Equal),
        Operator::In(candidates) => candidates.iter().any(|c| equals(value, c)),
        Operator::Nin(candidates) => !candidates.iter().any(|c| equals(value, c)),
        Operator::Exists(flag) => value.is_some() == *flag,
    }
}

// Missing fields equal null. Arrays match when the whole array or any element
// matches.
fn equals(value: Option<&PropertyValue>, expected: &PropertyValue) -> bool {
    match value {
        None => *expected == PropertyValue::Null,
        Some(actual) => {
            actual.loosely_equals(expected)
                || matches!(actual, PropertyValue::Array(items) if items.iter().any(|item| item.loosely_equals(expected)))
        }
    }
}

fn ordered(
    value: Option<&PropertyValue>,
    bound: &PropertyValue,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> bool {
    match value {
        None => false,
        Some(PropertyValue::Array(items)) => items
            .iter()
            .any(|item| item.compare(bound).is_some_and(&accept)),
        Some(actual) => actual.compare(bound).is_some_and(accept),
    }
}

/// Restricts a stored edge to the fields a caller asked for.
pub fn project(edge: &Edge, projection: &Projection) -> ProjectedEdge {
    let props = match projection {
        Projection::IdentityOnly => None,
        Projection::AllProps => edge.props.clone(),
        Projection::Props(names) => edge.props.as_ref().map(|stored| {
            let mut selected = PropertyMap::new();
            for name in names {
                if let Some(value) = get_path(stored, name) {
                    // Names are visited in order, so a prefix is copied before
                    // its descendants and always as a map: this cannot conflict.
                    let _ = set_path(&mut selected, name, value.clone());
                }
            }
            selected
        }),
    };

    ProjectedEdge {
        src: edge.src,
        dest: edge.dest,
        props,
    }
}

/// Applies assign and clear clauses in place. On error the edge may be
/// half-updated; engines apply updates to a copy.
pub fn apply_update(edge: &mut Edge, update: &Update) -> GraphResult<()> {
    if !update.assign.is_empty() {
        let props = edge.props.get_or_insert_with(PropertyMap::new);
        for (name, value) in &update.assign {
            set_path(props, name, value.clone())?;
        }
    }

    match &update.clear {
        Clear::Nothing => {}
        Clear::All => edge.props = None,
        Clear::Paths(names) => {
            if let Some(props) = edge.props.as_mut() {
                for name in names {
                    unset_path(props, name);
                }
            }
        }
    }
    Ok(())
}

/// Builds the edge inserted by an upsert from the filter's identity
/// conditions. The uniqueness key is always recomputed from the endpoints.
pub fn seed(filter: &Filter) -> GraphResult<Edge> {
    let (Some(src), Some(dest)) = (filter.src, filter.dest) else {
        return Err(GraphError::InvalidData(
            "cannot insert an edge without both src and dest".to_string(),
        ));
    };
    let edge = Edge::new(src, dest);
    if let Some(key) = &filter.unique_index {
        if *key != edge.unique_index {
            return Err(GraphError::InvalidData(format!(
                "uniqueIndex {} does not belong to {} -> {}",
                key, src, dest
            )));
        }
    }
    Ok(edge)
}

/// Resolves one upsert against the edge currently stored under the filter's
/// uniqueness key. Returns the edge to write back, or `None` when nothing
/// matched and `options.upsert` is off.
///
/// An existing edge that fails the rest of the filter would force an insert
/// under an already taken key, which is reported as `GraphError::DuplicateKey`.
pub fn resolve_upsert(
    existing: Option<&Edge>,
    filter: &Filter,
    update: &Update,
    options: &UpsertOptions,
) -> GraphResult<Option<Edge>> {
    let mut next = match existing {
        Some(edge) if matches(edge, filter) => edge.clone(),
        Some(edge) => return Err(GraphError::DuplicateKey(edge.unique_index.clone())),
        None if options.upsert => seed(filter)?,
        None => return Ok(None),
    };
    apply_update(&mut next, update)?;
    Ok(Some(next))
}

/// The uniqueness key an upsert is located by.
pub fn upsert_key(filter: &Filter) -> GraphResult<&str> {
    filter
        .unique_index
        .as_deref()
        .ok_or_else(|| GraphError::InvalidData("upsert requires a uniqueIndex condition".to_string()))
}
