// models/src/edges.rs
use crate::identifiers::NodeId;
use crate::properties::PropertyMap;
use serde::{Deserialize, Serialize};

/// Canonical uniqueness key of the directed pair `src -> dest`.
///
/// Every lookup and every insert derives the key through this function, so
/// two requests for the same pair always collide on the same stored edge.
pub fn unique_index(src: &NodeId, dest: &NodeId) -> String {
    format!("{}:{}", src, dest)
}

/// A directed edge as it is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Node the edge starts from.
    pub src: NodeId,

    /// Node the edge ends at.
    pub dest: NodeId,

    /// Always `unique_index(src, dest)`.
    #[serde(rename = "uniqueIndex")]
    pub unique_index: String,

    /// `None` until a property is first set, and again after all
    /// properties are cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<PropertyMap>,
}

impl Edge {
    /// Creates an edge without properties.
    pub fn new(src: NodeId, dest: NodeId) -> Self {
        Self {
            src,
            dest,
            unique_index: unique_index(&src, &dest),
            props: None,
        }
    }

    pub fn with_props(mut self, props: PropertyMap) -> Self {
        self.props = Some(props);
        self
    }
}

/// The caller-facing view of an edge: identity fields plus whatever part of
/// `props` was selected. The uniqueness key is never exposed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedEdge {
    pub src: NodeId,
    pub dest: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<PropertyMap>,
}

impl ProjectedEdge {
    /// Properties of the projected edge, empty if none were selected or set.
    pub fn props_or_empty(&self) -> PropertyMap {
        self.props.clone().unwrap_or_default()
    }
}
