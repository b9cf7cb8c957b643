// lib/src/lib.rs

pub mod config;
pub mod database;
pub mod query_compiler;
pub mod query_exec_engine;
pub mod storage_engine;

pub use crate::config::{EdgeStoreConfig, StorageEngineType};
pub use crate::database::EdgeStore;
pub use crate::query_exec_engine::{Outcome, QueryExecEngine};
pub use crate::storage_engine::{create_storage, EdgeCollection, InMemoryStorage, SledStorage};

pub use models::errors::{GraphError, GraphResult, ValidationError};
pub use models::{
    find_conditions, unique_index, EdgeProperties, EdgeQuery, EdgeSelection, FindConditions, Json, MatchExpr,
    NodeId, Operator, ProjectedEdge, PropertyMap, PropertyName, PropertySelector, PropertyValue,
};
