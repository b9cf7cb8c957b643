// lib/src/database.rs

use std::sync::Arc;

use log::{debug, info};
use models::errors::GraphResult;
use models::{EdgeDescriptor, EdgeProperties, EdgeQuery, EdgeSelection, ProjectedEdge};

use crate::config::EdgeStoreConfig;
use crate::query_compiler::{
    compile, find_descriptor, get_descriptor, peek_descriptor, remove_descriptor, set_descriptor,
};
use crate::query_exec_engine::{Outcome, QueryExecEngine};
use crate::storage_engine::{create_storage, EdgeCollection};

/// Property store for directed edges between pairs of nodes.
///
/// Each `(src, dest)` pair owns at most one edge document. Every call
/// compiles its request into one persistence operation and runs it on the
/// configured engine; nothing is cached or locked here.
pub struct EdgeStore {
    executor: QueryExecEngine,
    upsert_on_read: bool,
}

impl EdgeStore {
    /// Builds and starts the engine described by `config`.
    pub async fn open(config: &EdgeStoreConfig) -> GraphResult<Self> {
        let storage = create_storage(config)?;
        storage.start().await?;
        info!(
            "EdgeStore opened on {} storage (upsert_on_read: {})",
            storage.get_type(),
            config.upsert_on_read
        );
        Ok(Self::with_engine(storage).with_upsert_on_read(config.upsert_on_read))
    }

    /// Wraps an engine the caller manages. The engine must already be
    /// started; `close` stops it.
    pub fn with_engine(storage: Arc<dyn EdgeCollection>) -> Self {
        EdgeStore {
            executor: QueryExecEngine::new(storage),
            upsert_on_read: true,
        }
    }

    pub fn with_upsert_on_read(mut self, upsert_on_read: bool) -> Self {
        self.upsert_on_read = upsert_on_read;
        self
    }

    pub fn engine(&self) -> &Arc<dyn EdgeCollection> {
        self.executor.storage()
    }

    pub fn upsert_on_read(&self) -> bool {
        self.upsert_on_read
    }

    /// Stops the engine, persisting whatever it holds.
    pub async fn close(&self) -> GraphResult<()> {
        self.engine().stop().await?;
        info!("EdgeStore closed.");
        Ok(())
    }

    async fn run(&self, descriptor: &EdgeDescriptor) -> GraphResult<Outcome> {
        let operation = compile(descriptor)?;
        self.executor.execute(operation).await
    }

    /// Sets every property in `edge.props` on the edge `src -> dest`,
    /// creating the edge if needed. Properties not named keep their values.
    pub async fn set_properties(&self, edge: &EdgeProperties) -> GraphResult<()> {
        debug!("set_properties {} -> {} ({} props)", edge.src, edge.dest, edge.props.len());
        self.run(&set_descriptor(edge)?).await?;
        Ok(())
    }

    /// Reads the selected properties of the edge `src -> dest`.
    ///
    /// With `upsert_on_read` (the default) this goes through the upsert path:
    /// a missing edge is created empty and always returned. Without it the
    /// read has no side effect and a missing edge gives `None`.
    pub async fn get_properties(&self, edge: &EdgeSelection) -> GraphResult<Option<ProjectedEdge>> {
        debug!("get_properties {} -> {}", edge.src, edge.dest);
        let descriptor = if self.upsert_on_read {
            get_descriptor(edge)
        } else {
            peek_descriptor(edge)
        };
        Ok(self.run(&descriptor).await?.into_one())
    }

    /// Clears the selected properties, or all of them when `edge.props` is
    /// `None`.
    pub async fn remove_properties(&self, edge: &EdgeSelection) -> GraphResult<()> {
        debug!("remove_properties {} -> {}", edge.src, edge.dest);
        self.run(&remove_descriptor(edge)).await?;
        Ok(())
    }

    /// Returns every edge matching the query. A query naming no `src`,
    /// `dest` or `find` yields no edges and never reaches storage.
    pub async fn find_edges(&self, query: &EdgeQuery) -> GraphResult<Vec<ProjectedEdge>> {
        let Some(descriptor) = find_descriptor(query) else {
            debug!("find_edges without predicates, skipping storage");
            return Ok(Vec::new());
        };
        Ok(self.run(&descriptor).await?.into_many())
    }
}
