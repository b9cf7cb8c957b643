// lib/src/storage_engine/mod.rs

pub mod document;
pub mod inmemory_storage;
pub mod sled_storage;
pub mod storage_engine;
pub mod storage_utils;

pub use inmemory_storage::InMemoryStorage;
pub use sled_storage::{open_sled_db, SledStorage};
pub use storage_engine::EdgeCollection;
#[cfg(test)]
pub use storage_engine::MockEdgeCollection;

use std::sync::Arc;

use log::{error, info};
use models::errors::{GraphError, GraphResult};

use crate::config::{EdgeStoreConfig, StorageEngineType};

/// Builds the engine selected by `config`. The engine is returned stopped.
pub fn create_storage(config: &EdgeStoreConfig) -> GraphResult<Arc<dyn EdgeCollection>> {
    match config.storage_engine_type {
        StorageEngineType::Sled => {
            let Some(path) = config.data_directory.as_deref() else {
                error!("Sled engine selected without a data directory");
                return Err(GraphError::ConfigError("Sled storage requires data_directory".to_string()));
            };
            let storage = SledStorage::open(path, config.cache_capacity, config.use_compression)?;
            Ok(Arc::new(storage))
        }
        StorageEngineType::InMemory => {
            let storage = match &config.snapshot_file {
                Some(path) => {
                    info!("InMemory storage persisted to {:?}", path);
                    InMemoryStorage::with_snapshot(path)
                }
                None => InMemoryStorage::new(),
            };
            Ok(Arc::new(storage))
        }
    }
}
