// lib/src/storage_engine/sled_storage.rs
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use log::{debug, error, info, warn};
use models::errors::{GraphError, GraphResult};
use models::ProjectedEdge;

use super::document::{matches, project, resolve_upsert, upsert_key};
use super::storage_engine::EdgeCollection;
use super::storage_utils::{deserialize_edge, serialize_edge};
use crate::query_compiler::{Filter, Projection, Update, UpsertOptions};

const EDGE_TREE: &str = "edges";

/// Opens (creating if needed) the sled database backing a `SledStorage`.
pub fn open_sled_db(path: &Path, cache_capacity: Option<u64>, use_compression: bool) -> GraphResult<sled::Db> {
    if path.exists() && !path.is_dir() {
        error!("Path {:?} exists but is not a directory", path);
        return Err(GraphError::StorageError(format!("Path {:?} is not a directory", path)));
    }
    std::fs::create_dir_all(path).map_err(|e| {
        error!("Failed to create database directory at {:?}: {}", path, e);
        GraphError::StorageError(format!("Failed to create database directory at {:?}: {}", path, e))
    })?;

    let mut config = sled::Config::new().path(path);
    if let Some(capacity) = cache_capacity {
        config = config.cache_capacity(capacity);
    }
    if use_compression {
        config = config.use_compression(true);
    }
    config.open().map_err(|e| {
        error!("Failed to open Sled database at {:?}: {}", path, e);
        GraphError::StorageError(format!(
            "Failed to open Sled database at {:?}: {}. Ensure the directory is accessible.",
            path, e
        ))
    })
}

/// Edge collection stored in a sled tree keyed by `uniqueIndex`.
#[derive(Debug)]
pub struct SledStorage {
    db: sled::Db,
    tree: sled::Tree,
    path: PathBuf,
    running: AtomicBool,
}

impl SledStorage {
    pub fn new(db: sled::Db, path: impl Into<PathBuf>) -> GraphResult<Self> {
        let tree = db.open_tree(EDGE_TREE)?;
        Ok(SledStorage {
            db,
            tree,
            path: path.into(),
            running: AtomicBool::new(false),
        })
    }

    /// Opens the database at `path` and wraps it.
    pub fn open(path: &Path, cache_capacity: Option<u64>, use_compression: bool) -> GraphResult<Self> {
        info!("Opening Sled database at {:?}", path);
        let db = open_sled_db(path, cache_capacity, use_compression)?;
        Self::new(db, path)
    }

    fn ensure_running(&self) -> GraphResult<()> {
        if self.running.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(GraphError::ConnectionError(format!("{} engine has not been started", self.get_type())))
        }
    }

    // Every sled call blocks, so each operation runs on the blocking pool
    // against its own handle to the tree.
    async fn with_tree<T, F>(&self, work: F) -> GraphResult<T>
    where
        T: Send + 'static,
        F: FnOnce(sled::Tree) -> GraphResult<T> + Send + 'static,
    {
        self.ensure_running()?;
        let tree = self.tree.clone();
        tokio::task::spawn_blocking(move || work(tree)).await?
    }
}

/// Compare-and-swap loop: re-reads and re-resolves whenever another writer
/// got to the key first, so concurrent upserts never lose an update and never
/// produce two edges for one pair.
fn upsert_blocking(
    tree: &sled::Tree,
    key: &str,
    filter: &Filter,
    update: &Update,
    options: &UpsertOptions,
) -> GraphResult<Option<ProjectedEdge>> {
    loop {
        let current = tree.get(key)?;
        let existing = current.as_deref().map(deserialize_edge).transpose()?;
        let Some(edge) = resolve_upsert(existing.as_ref(), filter, update, options)? else {
            return Ok(None);
        };

        let bytes = serialize_edge(&edge)?;
        match tree.compare_and_swap(key, current, Some(bytes))? {
            Ok(()) => {
                return Ok(options.return_document.then(|| project(&edge, &options.projection)));
            }
            Err(_) => debug!("Concurrent write on {}, retrying upsert", key),
        }
    }
}

#[async_trait]
impl EdgeCollection for SledStorage {
    async fn start(&self) -> GraphResult<()> {
        self.running.store(true, Ordering::Release);
        info!("SledStorage started at {:?} with {} edges", self.path, self.tree.len());
        Ok(())
    }

    async fn stop(&self) -> GraphResult<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        self.db.flush_async().await?;
        info!("SledStorage stopped.");
        Ok(())
    }

    fn get_type(&self) -> &'static str {
        "Sled"
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
        let key = upsert_key(filter)?.to_string();
        let (filter, update, options) = (filter.clone(), update.clone(), options.clone());
        let result = self
            .with_tree(move |tree| upsert_blocking(&tree, &key, &filter, &update, &options))
            .await;
        if let Err(e) = &result {
            warn!("Sled upsert failed: {}", e);
        }
        result
    }

    async fn find_many(&self, filter: &Filter, projection: &Projection) -> GraphResult<Vec<ProjectedEdge>> {
        let (filter, projection) = (filter.clone(), projection.clone());
        self.with_tree(move |tree| {
            if let Some(key) = filter.unique_index.as_deref() {
                let Some(bytes) = tree.get(key)? else {
                    return Ok(Vec::new());
                };
                let edge = deserialize_edge(&bytes)?;
                return Ok(matches(&edge, &filter)
                    .then(|| project(&edge, &projection))
                    .into_iter()
                    .collect());
            }

            let mut found = Vec::new();
            for entry in tree.iter() {
                let (_, bytes) = entry?;
                let edge = deserialize_edge(&bytes)?;
                if matches(&edge, &filter) {
                    found.push(project(&edge, &projection));
                }
            }
            Ok(found)
        })
        .await
    }

    async fn count_documents(&self, filter: &Filter) -> GraphResult<usize> {
        let filter = filter.clone();
        self.with_tree(move |tree| {
            let mut count = 0;
            for entry in tree.iter() {
                let (_, bytes) = entry?;
                if matches(&deserialize_edge(&bytes)?, &filter) {
                    count += 1;
                }
            }
            Ok(count)
        })
        .await
    }

    async fn flush(&self) -> GraphResult<()> {
        self.ensure_running()?;
        let written = self.tree.flush_async().await?;
        debug!("Flushed {} bytes to {:?}", written, self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{unique_index, NodeId, PropertyName, PropertyValue};
    use std::sync::Arc;

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

    fn options() -> UpsertOptions {
        UpsertOptions {
            upsert: true,
            projection: Projection::AllProps,
            return_document: true,
        }
    }

    #[tokio::test]
    async fn open_rejects_file_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = SledStorage::open(file.path(), None, false).unwrap_err();
        assert!(matches!(err, GraphError::StorageError(_)));
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());
        {
            let storage = SledStorage::open(dir.path(), None, false).unwrap();
            storage.start().await.unwrap();
            storage.upsert_one(&pair_filter(src, dest), &assign("friend", true), &options()).await.unwrap();
            storage.stop().await.unwrap();
        }

        let storage = SledStorage::open(dir.path(), None, false).unwrap();
        storage.start().await.unwrap();
        let edges = storage.find_many(&pair_filter(src, dest), &Projection::AllProps).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].props.as_ref().unwrap()["friend"], PropertyValue::Boolean(true));
    }

    #[tokio::test]
    async fn flush_requires_running_engine_and_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SledStorage::open(dir.path(), None, false).unwrap();
        assert!(matches!(storage.flush().await, Err(GraphError::ConnectionError(_))));

        storage.start().await.unwrap();
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());
        storage.upsert_one(&pair_filter(src, dest), &assign("friend", true), &options()).await.unwrap();
        storage.flush().await.unwrap();
        assert!(storage.is_running());
        assert_eq!(storage.count_documents(&Filter::default()).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_keep_one_edge_and_every_property() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(SledStorage::open(dir.path(), None, false).unwrap());
        storage.start().await.unwrap();
        let (src, dest) = (NodeId::new_v4(), NodeId::new_v4());

        let tasks: Vec<_> = (0..16i64)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage.upsert_one(&pair_filter(src, dest), &assign(&format!("p{i}"), i), &options()).await
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
}
