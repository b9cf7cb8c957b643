// lib/src/query_compiler/operation.rs

use std::collections::{BTreeMap, BTreeSet};

use models::{MatchExpr, NodeId, PropertyName, PropertyValue};

/// Predicate over stored edges. Every present condition must hold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    pub src: Option<NodeId>,
    pub dest: Option<NodeId>,
    pub unique_index: Option<String>,
    /// Conditions on `props.<name>`, passed through uninterpreted.
    pub props: Vec<(PropertyName, MatchExpr)>,
}

/// Which part of `props` a result carries. Identity fields (`src`, `dest`)
/// are always returned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    IdentityOnly,
    AllProps,
    Props(BTreeSet<PropertyName>),
}

/// Properties cleared by an update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Clear {
    #[default]
    Nothing,
    /// Unsets the whole top-level `props` field.
    All,
    Paths(BTreeSet<PropertyName>),
}

/// Property-level changes applied to a single edge. Never replaces the
/// whole document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Update {
    pub assign: BTreeMap<PropertyName, PropertyValue>,
    pub clear: Clear,
}

impl Update {
    pub fn is_empty(&self) -> bool {
        self.assign.is_empty() && self.clear == Clear::Nothing
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpsertOptions {
    /// Insert a fresh edge when nothing matches the filter.
    pub upsert: bool,
    pub projection: Projection,
    /// Return the post-update edge restricted to `projection`.
    pub return_document: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Exactly one edge, located through the filter's uniqueness key.
    Single,
    /// Every edge satisfying the filter; read-only.
    Many,
}

/// Result of compiling one descriptor: a single persistence call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledOperation {
    pub target: Target,
    pub filter: Filter,
    pub projection: Projection,
    /// Always `Some` for `Target::Single`, always `None` for `Target::Many`.
    pub update: Option<Update>,
    /// Whether the caller asked for properties back.
    pub returns_document: bool,
}

impl CompiledOperation {
    /// Options for the upsert primitive derived from this operation.
    pub fn upsert_options(&self) -> UpsertOptions {
        UpsertOptions {
            upsert: true,
            projection: self.projection.clone(),
            return_document: self.returns_document,
        }
    }
}
