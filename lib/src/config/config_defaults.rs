// lib/src/config/config_defaults.rs

use std::path::PathBuf;

use super::config_structs::StorageEngineType;

pub const DEFAULT_DATA_DIRECTORY: &str = "./edgeprops_data/sled";
pub const DEFAULT_CACHE_CAPACITY: u64 = 1024 * 1024 * 1024;

pub fn default_storage_engine_type() -> StorageEngineType { StorageEngineType::InMemory }
pub fn default_data_directory() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_DATA_DIRECTORY))
}
pub fn default_cache_capacity() -> Option<u64> { Some(DEFAULT_CACHE_CAPACITY) }
pub fn default_upsert_on_read() -> bool { true }
