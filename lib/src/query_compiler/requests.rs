// lib/src/query_compiler/requests.rs
//! Normalizes the public request shapes into descriptors.

use std::collections::BTreeMap;

use models::errors::GraphResult;
use models::properties::validate_nested_keys;
use models::{EdgeDescriptor, EdgeProperties, EdgeQuery, EdgeSelection, FindConditions, PropertyName, PropertySelector};

/// `set_properties`: assign every given property, return nothing.
///
/// # Errors
/// Fails when a property key is not a valid property name, or when a key
/// nested inside a map value could not be addressed by a dot-path.
pub fn set_descriptor(edge: &EdgeProperties) -> GraphResult<EdgeDescriptor> {
    let set = edge
        .props
        .iter()
        .map(|(key, value)| -> GraphResult<_> {
            let name = PropertyName::new(key.as_str())?;
            validate_nested_keys(value)?;
            Ok((name, value.clone()))
        })
        .collect::<GraphResult<BTreeMap<_, _>>>()?;

    Ok(EdgeDescriptor {
        set: Some(set),
        ..EdgeDescriptor::single(edge.src, edge.dest)
    })
}

/// `get_properties` through the upsert path. Missing `props` reads all.
pub fn get_descriptor(edge: &EdgeSelection) -> EdgeDescriptor {
    EdgeDescriptor {
        get: Some(edge.props.clone().unwrap_or(PropertySelector::All)),
        ..EdgeDescriptor::single(edge.src, edge.dest)
    }
}

/// `get_properties` as a pure read: a search pinned to one pair, so a
/// missing edge is not created.
pub fn peek_descriptor(edge: &EdgeSelection) -> EdgeDescriptor {
    EdgeDescriptor {
        find: Some(FindConditions::new()),
        ..get_descriptor(edge)
    }
}

/// `remove_properties`. Missing `props` clears all.
pub fn remove_descriptor(edge: &EdgeSelection) -> EdgeDescriptor {
    EdgeDescriptor {
        remove: Some(edge.props.clone().unwrap_or(PropertySelector::All)),
        ..EdgeDescriptor::single(edge.src, edge.dest)
    }
}

/// `find_edges`. Returns `None` when the query has no predicate at all; such
/// a query must not reach storage.
pub fn find_descriptor(query: &EdgeQuery) -> Option<EdgeDescriptor> {
    if !query.is_plausible() {
        return None;
    }

    Some(EdgeDescriptor {
        src: query.src,
        dest: query.dest,
        find: Some(query.find.clone().unwrap_or_default()),
        get: Some(query.props.clone().unwrap_or(PropertySelector::All)),
        ..EdgeDescriptor::default()
    })
}
