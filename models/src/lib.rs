// models/src/lib.rs
//! Shared data types of the edge property store: endpoint identifiers,
//! property values, stored and projected edges, request shapes and errors.

pub mod edges;
pub mod errors;
pub mod identifiers;
pub mod properties;
pub mod queries;

pub use edges::{unique_index, Edge, ProjectedEdge};
pub use errors::{GraphError, GraphResult, ValidationError, ValidationResult};
pub use identifiers::{NodeId, PropertyName};
pub use properties::{PropertyMap, PropertyValue, SerializableFloat};
pub use queries::{
    find_conditions, EdgeDescriptor, EdgeProperties, EdgeQuery, EdgeSelection, FindConditions,
    MatchExpr, Operator, PropertySelector,
};
pub use serde_json::Value as Json;
