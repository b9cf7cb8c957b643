// lib/src/config/config_structs.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config_defaults::*;
use super::config_serializers::storage_engine_type_serde;

/// Storage engines an `EdgeStore` can be opened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageEngineType {
    InMemory,
    Sled,
}

impl fmt::Display for StorageEngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageEngineType::InMemory => write!(f, "InMemory"),
            StorageEngineType::Sled => write!(f, "Sled"),
        }
    }
}

impl FromStr for StorageEngineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inmemory" | "in-memory" | "in_memory" | "memory" => Ok(StorageEngineType::InMemory),
            "sled" => Ok(StorageEngineType::Sled),
            other => Err(format!("Unsupported storage engine type: {}", other)),
        }
    }
}

/// Configuration of an edge store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStoreConfig {
    #[serde(with = "storage_engine_type_serde", default = "default_storage_engine_type", alias = "storage-engine-type")]
    pub storage_engine_type: StorageEngineType,
    /// Directory of the sled database.
    #[serde(default = "default_data_directory", alias = "data-directory")]
    pub data_directory: Option<PathBuf>,
    /// MessagePack snapshot of the in-memory engine. No snapshot, no persistence.
    #[serde(default, alias = "snapshot-file")]
    pub snapshot_file: Option<PathBuf>,
    #[serde(default = "default_cache_capacity", alias = "cache-capacity")]
    pub cache_capacity: Option<u64>,
    #[serde(default, alias = "use-compression")]
    pub use_compression: bool,
    /// Reads go through the upsert path and create a missing edge, as the
    /// store always did. Off turns `get_properties` into a pure read.
    #[serde(default = "default_upsert_on_read", alias = "upsert-on-read")]
    pub upsert_on_read: bool,
}

/// Top-level layout of the YAML file: everything lives under `storage:`.
#[derive(Debug, Deserialize)]
pub struct StorageConfigWrapper {
    pub storage: EdgeStoreConfig,
}
