// lib/src/query_exec_engine/query_exec_engine.rs

use std::sync::Arc;

use log::{debug, warn};
use models::errors::{GraphError, GraphResult};
use models::ProjectedEdge;

use crate::query_compiler::{CompiledOperation, Target};
use crate::storage_engine::EdgeCollection;

/// What an executed operation produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Single-edge operation that asked for nothing back.
    Nothing,
    One(Option<ProjectedEdge>),
    Many(Vec<ProjectedEdge>),
}

impl Outcome {
    pub fn into_one(self) -> Option<ProjectedEdge> {
        match self {
            Outcome::One(edge) => edge,
            Outcome::Many(mut edges) => {
                if edges.is_empty() { None } else { Some(edges.swap_remove(0)) }
            }
            Outcome::Nothing => None,
        }
    }

    pub fn into_many(self) -> Vec<ProjectedEdge> {
        match self {
            Outcome::Many(edges) => edges,
            Outcome::One(edge) => edge.into_iter().collect(),
            Outcome::Nothing => Vec::new(),
        }
    }
}

/// Runs compiled operations against one storage engine.
pub struct QueryExecEngine {
    storage: Arc<dyn EdgeCollection>,
}

impl QueryExecEngine {
    pub fn new(storage: Arc<dyn EdgeCollection>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn EdgeCollection> {
        &self.storage
    }

    /// Issues exactly one persistence call for `operation`. Storage errors
    /// come back unchanged.
    pub async fn execute(&self, operation: CompiledOperation) -> GraphResult<Outcome> {
        match &operation.target {
            Target::Single => {
                let key = operation.filter.unique_index.as_deref().unwrap_or("<unkeyed>");
                let Some(update) = operation.update.as_ref() else {
                    return Err(GraphError::InternalError(format!(
                        "single-edge operation on {} carries no update",
                        key
                    )));
                };
                debug!("Upserting edge {} on {}", key, self.storage.get_type());
                let options = operation.upsert_options();
                let edge = self
                    .storage
                    .upsert_one(&operation.filter, update, &options)
                    .await
                    .map_err(|e| {
                        warn!("Upsert of {} failed: {}", key, e);
                        e
                    })?;
                if operation.returns_document {
                    Ok(Outcome::One(edge))
                } else {
                    Ok(Outcome::Nothing)
                }
            }
            Target::Many => {
                debug!("Searching edges with {} property conditions", operation.filter.props.len());
                let edges = self
                    .storage
                    .find_many(&operation.filter, &operation.projection)
                    .await
                    .map_err(|e| {
                        warn!("Edge search failed: {}", e);
                        e
                    })?;
                debug!("Search matched {} edges", edges.len());
                Ok(Outcome::Many(edges))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_compiler::{compile, Projection};
    use crate::storage_engine::MockEdgeCollection;
    use mockall::predicate::always;
    use models::{EdgeDescriptor, FindConditions, NodeId, PropertySelector};

    #[tokio::test]
    async fn single_operation_issues_one_upsert() {
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());
        let descriptor = EdgeDescriptor {
            get: Some(PropertySelector::All),
            ..EdgeDescriptor::single(src, dest)
        };

        let mut mock = MockEdgeCollection::new();
        mock.expect_get_type().return_const("Mock");
        mock.expect_upsert_one()
            .withf(move |filter, update, options| {
                filter.src == Some(src)
                    && filter.dest == Some(dest)
                    && filter.unique_index.is_some()
                    && update.is_empty()
                    && options.upsert
                    && options.return_document
                    && options.projection == Projection::AllProps
            })
            .times(1)
            .returning(move |_, _, _| Ok(Some(ProjectedEdge { src, dest, props: None })));
        mock.expect_find_many().never();

        let engine = QueryExecEngine::new(Arc::new(mock));
        let outcome = engine.execute(compile(&descriptor).unwrap()).await.unwrap();
        assert_eq!(outcome, Outcome::One(Some(ProjectedEdge { src, dest, props: None })));
    }

    #[tokio::test]
    async fn single_operation_without_get_returns_nothing() {
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());
        let mut mock = MockEdgeCollection::new();
        mock.expect_get_type().return_const("Mock");
        mock.expect_upsert_one()
            .with(always(), always(), always())
            .times(1)
            .returning(|_, _, _| Ok(None));

        let engine = QueryExecEngine::new(Arc::new(mock));
        let outcome = engine.execute(compile(&EdgeDescriptor::single(src, dest)).unwrap()).await.unwrap();
        assert_eq!(outcome, Outcome::Nothing);
    }

    #[tokio::test]
    async fn search_issues_one_find_many() {
        let dest = NodeId::new_v4();
        let descriptor = EdgeDescriptor {
            dest: Some(dest),
            find: Some(FindConditions::new()),
            get: Some(PropertySelector::All),
            ..EdgeDescriptor::default()
        };

        let mut mock = MockEdgeCollection::new();
        mock.expect_find_many()
            .withf(move |filter, projection| filter.dest == Some(dest) && *projection == Projection::AllProps)
            .times(1)
            .returning(|_, _| Ok(vec![]));
        mock.expect_upsert_one().never();

        let engine = QueryExecEngine::new(Arc::new(mock));
        let outcome = engine.execute(compile(&descriptor).unwrap()).await.unwrap();
        assert_eq!(outcome, Outcome::Many(vec![]));
    }

    #[tokio::test]
    async fn storage_errors_pass_through() {
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());
        let mut mock = MockEdgeCollection::new();
        mock.expect_get_type().return_const("Mock");
        mock.expect_upsert_one()
            .returning(|_, _, _| Err(GraphError::DuplicateKey("taken".to_string())));

        let engine = QueryExecEngine::new(Arc::new(mock));
        let err = engine.execute(compile(&EdgeDescriptor::single(src, dest)).unwrap()).await.unwrap_err();
        assert!(matches!(err, GraphError::DuplicateKey(_)));
    }

    #[test]
    fn outcome_conversions() {
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());
        let edge = ProjectedEdge { src, dest, props: None };
        assert_eq!(Outcome::Many(vec![edge.clone()]).into_one(), Some(edge.clone()));
        assert_eq!(Outcome::One(Some(edge.clone())).into_many(), vec![edge]);
        assert!(Outcome::Nothing.into_many().is_empty());
    }
}
