// lib/src/config/config_serializers.rs

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serializer};
use std::str::FromStr;

use super::config_structs::StorageEngineType;

pub mod storage_engine_type_serde {
    use super::*;

    pub fn serialize<S>(engine_type: &StorageEngineType, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&engine_type.to_string().to_lowercase())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<StorageEngineType, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // Hand-edited YAML sometimes carries the quotes inside the scalar.
        let sanitized = s.trim().trim_matches(|c| c == '"' || c == '\'');
        StorageEngineType::from_str(sanitized).map_err(D::Error::custom)
    }
}
