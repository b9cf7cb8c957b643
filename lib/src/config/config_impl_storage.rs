// lib/src/config/config_impl_storage.rs

use std::path::Path;

use anyhow::{Context, Result};
use log::{error, info};
use serde_yaml2 as serde_yaml;

use crate::config::config_defaults::*;
use crate::config::config_structs::*;

impl Default for EdgeStoreConfig {
    fn default() -> Self {
        EdgeStoreConfig {
            storage_engine_type: default_storage_engine_type(),
            data_directory: default_data_directory(),
            snapshot_file: None,
            cache_capacity: default_cache_capacity(),
            use_compression: false,
            upsert_on_read: default_upsert_on_read(),
        }
    }
}

impl EdgeStoreConfig {
    /// In-memory configuration with no snapshot.
    pub fn in_memory() -> Self {
        EdgeStoreConfig {
            storage_engine_type: StorageEngineType::InMemory,
            data_directory: None,
            ..Default::default()
        }
    }

    pub fn sled<P: AsRef<Path>>(data_directory: P) -> Self {
        EdgeStoreConfig {
            storage_engine_type: StorageEngineType::Sled,
            data_directory: Some(data_directory.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Parses a YAML document whose settings sit under a `storage:` key.
    pub fn from_yaml_str(content: &str) -> Result<EdgeStoreConfig> {
        let wrapper: StorageConfigWrapper = serde_yaml::from_str(content)
            .context("Failed to parse YAML as StorageConfigWrapper")
            .map_err(|e| {
                error!("Deserialization error: {:?}", e);
                e
            })?;
        Ok(wrapper.storage)
    }

    /// Loads the configuration at `path`, falling back to defaults when the
    /// file does not exist.
    pub async fn load(path: &Path) -> Result<EdgeStoreConfig> {
        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(EdgeStoreConfig::default());
        }

        let config_content = tokio::fs::read_to_string(path)
            .await
            .context(format!("Failed to read storage config file: {}", path.display()))?;
        let config = Self::from_yaml_str(&config_content)
            .context(format!("Invalid storage config in {}", path.display()))?;
        info!(
            "Loaded storage config from {:?}: engine {}, upsert_on_read {}",
            path, config.storage_engine_type, config.upsert_on_read
        );
        Ok(config)
    }
}
