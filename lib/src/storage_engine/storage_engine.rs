// lib/src/storage_engine/storage_engine.rs

use async_trait::async_trait;
use models::errors::GraphResult;
use models::ProjectedEdge;

use crate::query_compiler::{Filter, Projection, Update, UpsertOptions};

/// Persistence collaborator holding the edge collection.
///
/// Engines own the uniqueness constraint on `uniqueIndex`: each call below
/// is atomic with respect to the edge it touches, and the core never locks
/// anything itself. Lifecycle (`start`/`stop`) belongs to whoever created
/// the engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EdgeCollection: Send + Sync {
    async fn start(&self) -> GraphResult<()>;

    async fn stop(&self) -> GraphResult<()>;

    fn get_type(&self) -> &'static str;

    fn is_running(&self) -> bool;

    /// Finds the edge matching `filter` and applies `update` to it, inserting
    /// a new edge first when none exists and `options.upsert` is set.
    ///
    /// Returns the post-update edge restricted to `options.projection` when
    /// `options.return_document` is set, `None` otherwise.
    async fn upsert_one(
        &self,
        filter: &Filter,
        update: &Update,
        options: &UpsertOptions,
    ) -> GraphResult<Option<ProjectedEdge>>;

    /// Every edge matching `filter`, ordered by uniqueness key.
    async fn find_many(&self, filter: &Filter, projection: &Projection) -> GraphResult<Vec<ProjectedEdge>>;

    /// Number of edges matching `filter`.
    async fn count_documents(&self, filter: &Filter) -> GraphResult<usize>;

    /// Persists buffered state, where the engine has any.
    async fn flush(&self) -> GraphResult<()>;
}
