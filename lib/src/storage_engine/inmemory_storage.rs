// lib/src/storage_engine/inmemory_storage.rs
use super::document::{matches, project, resolve_upsert, upsert_key};
use super::storage_engine::EdgeCollection;
use super::storage_utils::{read_snapshot, write_snapshot};
use crate::query_compiler::{Filter, Projection, Update, UpsertOptions};
use async_trait::async_trait;
use log::{debug, info, warn};
use models::errors::{GraphError, GraphResult};
use models::{Edge, ProjectedEdge};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Edge collection held in process memory, keyed by `uniqueIndex`.
///
/// With a snapshot path the collection is loaded on `start` and written back
/// on `flush` and `stop`; without one, data lives as long as the engine.
#[derive(Debug)]
pub struct InMemoryStorage {
    edges: Arc<RwLock<BTreeMap<String, Edge>>>,
    snapshot_path: Option<PathBuf>,
    running: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            edges: Arc::new(RwLock::new(BTreeMap::new())),
            snapshot_path: None,
            running: AtomicBool::new(false),
        }
    }

    /// Creates an engine persisted to a MessagePack snapshot file.
    pub fn with_snapshot<P: Into<PathBuf>>(path: P) -> Self {
        InMemoryStorage {
            snapshot_path: Some(path.into()),
            ..Self::new()
        }
    }

    fn ensure_running(&self) -> GraphResult<()> {
        if self.running.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(GraphError::ConnectionError(format!("{} engine has not been started", self.get_type())))
        }
    }

    async fn sync_snapshot(&self) -> GraphResult<()> {
        let Some(path) = self.snapshot_path.clone() else {
            return Ok(());
        };
        let edges = self.edges.read().await.clone();
        let count = edges.len();
        tokio::task::spawn_blocking(move || write_snapshot(&path, &edges)).await??;
        debug!("Wrote snapshot of {} edges", count);
        Ok(())
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EdgeCollection for InMemoryStorage {
    async fn start(&self) -> GraphResult<()> {
        // The snapshot is only loaded on a cold start.
        if self.running.load(Ordering::Acquire) {
            debug!("InMemoryStorage already running");
            return Ok(());
        }
        if let Some(path) = self.snapshot_path.clone() {
            let loaded = tokio::task::spawn_blocking(move || read_snapshot(&path)).await??;
            info!("Loaded {} edges from snapshot {:?}", loaded.len(), self.snapshot_path);
            *self.edges.write().await = loaded;
        }
        self.running.store(true, Ordering::Release);
        info!("InMemoryStorage started.");
        Ok(())
    }

    async fn stop(&self) -> GraphResult<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        self.sync_snapshot().await?;
        info!("InMemoryStorage stopped.");
        Ok(())
    }

    fn get_type(&self) -> &'static str {
        "InMemory"
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    async fn upsert_one(
        &self,
        filter: &Filter,
        update: &Update,
        options: &UpsertOptions,
    ) -> GraphResult<Option<ProjectedEdge>> {
        self.ensure_running()?;
        let key = upsert_key(filter)?;

        // The write lock spans read, update and write-back, so the upsert is
        // atomic for this key.
        let mut edges = self.edges.write().await;
        let next = resolve_upsert(edges.get(key), filter, update, options).map_err(|e| {
            warn!("Upsert on {} rejected: {}", key, e);
            e
        })?;

        let Some(edge) = next else {
            return Ok(None);
        };
        let result = options.return_document.then(|| project(&edge, &options.projection));
        debug!("Upserted edge {}", key);
        edges.insert(key.to_string(), edge);
        Ok(result)
    }

    async fn find_many(&self, filter: &Filter, projection: &Projection) -> GraphResult<Vec<ProjectedEdge>> {
        self.ensure_running()?;
        let edges = self.edges.read().await;

        // A uniqueness key in the filter pins the search to one slot.
        if let Some(key) = filter.unique_index.as_deref() {
            return Ok(edges
                .get(key)
                .filter(|edge| matches(edge, filter))
                .map(|edge| project(edge, projection))
                .into_iter()
                .collect());
        }

        Ok(edges
            .values()
            .filter(|edge| matches(edge, filter))
            .map(|edge| project(edge, projection))
            .collect())
    }

    async fn count_documents(&self, filter: &Filter) -> GraphResult<usize> {
        self.ensure_running()?;
        let edges = self.edges.read().await;
        Ok(edges.values().filter(|edge| matches(edge, filter)).count())
    }

    async fn flush(&self) -> GraphResult<()> {
        self.ensure_running()?;
        self.sync_snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_compiler::Clear;
    use models::{unique_index, NodeId, PropertyName, PropertyValue};

    fn pair_filter(src: NodeId, dest: NodeId) -> Filter {
        Filter {
            src: Some(src),
            dest: Some(dest),
            unique_index: Some(unique_index(&src, &dest)),
            props: vec![],
        }
    }

    fn assign(name: &str, value: impl Into<PropertyValue>) -> Update {
        let mut update = Update::default();
        update.assign.insert(PropertyName::new(name).unwrap(), value.into());
        update
    }

    fn upsert_options(return_document: bool) -> UpsertOptions {
        UpsertOptions {
            upsert: true,
            projection: Projection::AllProps,
            return_document,
        }
    }

    #[tokio::test]
    async fn rejects_calls_before_start() {
        let storage = InMemoryStorage::new();
        let err = storage.find_many(&Filter::default(), &Projection::AllProps).await.unwrap_err();
        assert!(matches!(err, GraphError::ConnectionError(_)));
        assert!(!storage.is_running());
    }

    #[tokio::test]
    async fn upsert_inserts_once_then_updates_in_place() {
        let storage = InMemoryStorage::new();
        storage.start().await.unwrap();
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());
        let filter = pair_filter(src, dest);

        let first = storage.upsert_one(&filter, &assign("friend", true), &upsert_options(false)).await.unwrap();
        assert_eq!(first, None);
        let second = storage
            .upsert_one(&filter, &assign("foe", false), &upsert_options(true))
            .await
            .unwrap()
            .unwrap();

        let props = second.props.unwrap();
        assert_eq!(props["friend"], PropertyValue::Boolean(true));
        assert_eq!(props["foe"], PropertyValue::Boolean(false));
        assert_eq!(storage.count_documents(&Filter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_upserts_on_one_pair_keep_a_single_edge() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.start().await.unwrap();
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());

        let tasks: Vec<_> = (0..16i64)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    let update = assign(&format!("p{i}"), i);
                    storage.upsert_one(&pair_filter(src, dest), &update, &upsert_options(false)).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(storage.count_documents(&Filter::default()).await.unwrap(), 1);
        let edges = storage.find_many(&pair_filter(src, dest), &Projection::AllProps).await.unwrap();
        assert_eq!(edges[0].props.as_ref().unwrap().len(), 16);
    }

    #[tokio::test]
    async fn snapshot_persists_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.msgpack");
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());

        let storage = InMemoryStorage::with_snapshot(&path);
        storage.start().await.unwrap();
        storage.upsert_one(&pair_filter(src, dest), &assign("friend", true), &upsert_options(false)).await.unwrap();
        storage.stop().await.unwrap();

        let reopened = InMemoryStorage::with_snapshot(&path);
        reopened.start().await.unwrap();
        let edges = reopened.find_many(&pair_filter(src, dest), &Projection::AllProps).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].props.as_ref().unwrap()["friend"], PropertyValue::Boolean(true));
    }

    #[tokio::test]
    async fn second_start_keeps_unflushed_writes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = InMemoryStorage::with_snapshot(dir.path().join("edges.msgpack"));
        storage.start().await.unwrap();
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());
        storage.upsert_one(&pair_filter(src, dest), &assign("friend", true), &upsert_options(false)).await.unwrap();

        storage.start().await.unwrap();
        assert!(storage.is_running());
        assert_eq!(storage.count_documents(&Filter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn flush_writes_snapshot_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.msgpack");
        let storage = InMemoryStorage::with_snapshot(&path);
        storage.start().await.unwrap();
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());
        storage.upsert_one(&pair_filter(src, dest), &assign("friend", true), &upsert_options(false)).await.unwrap();
        assert!(read_snapshot(&path).unwrap().is_empty());

        storage.flush().await.unwrap();
        assert!(storage.is_running());
        let snapshot = read_snapshot(&path).unwrap();
        assert_eq!(snapshot.len(), 1);
        let edge = &snapshot[&unique_index(&src, &dest)];
        assert_eq!(edge.props.as_ref().unwrap()["friend"], PropertyValue::Boolean(true));
    }

    #[tokio::test]
    async fn flush_without_snapshot_is_a_no_op() {
        let storage = InMemoryStorage::new();
        assert!(matches!(storage.flush().await, Err(GraphError::ConnectionError(_))));
        storage.start().await.unwrap();
        storage.flush().await.unwrap();
    }

    #[tokio::test]
    async fn failed_update_leaves_stored_edge_untouched() {
        let storage = InMemoryStorage::new();
        storage.start().await.unwrap();
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());
        let filter = pair_filter(src, dest);
        storage.upsert_one(&filter, &assign("friend", true), &upsert_options(false)).await.unwrap();

        let mut conflicting = assign("a", 1i64);
        conflicting.assign.insert(PropertyName::new("friend.since").unwrap(), 2014i64.into());
        conflicting.clear = Clear::Nothing;
        assert!(storage.upsert_one(&filter, &conflicting, &upsert_options(false)).await.is_err());

        let edges = storage.find_many(&filter, &Projection::AllProps).await.unwrap();
        let props = edges[0].props.as_ref().unwrap();
        assert!(!props.contains_key("a"));
        assert_eq!(props["friend"], PropertyValue::Boolean(true));
    }
}
