// models/src/errors.rs

use std::io;
pub use thiserror::Error;

use anyhow::Error as AnyhowError;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Storage error: {0}")]
    StorageError(String), // General storage operation error
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Storage engine is not running: {0}")]
    ConnectionError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// The uniqueness constraint on `uniqueIndex` rejected a write.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Invalid data provided: {0}")]
    InvalidData(String),
    #[error("An internal error occurred: {0}")]
    InternalError(String),

    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[cfg(feature = "sled-errors")]
    #[error(transparent)]
    Sled(#[from] sled::Error),
}

impl GraphError {
    /// True for caller-contract violations that were caught before any
    /// storage call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, GraphError::Validation(_))
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::SerializationError(format!("JSON processing error: {}", err))
    }
}

impl From<rmp_serde::encode::Error> for GraphError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        GraphError::SerializationError(format!("MessagePack encode error: {}", err))
    }
}

impl From<rmp_serde::decode::Error> for GraphError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        GraphError::DeserializationError(format!("MessagePack decode error: {}", err))
    }
}

impl From<AnyhowError> for GraphError {
    fn from(err: AnyhowError) -> Self {
        GraphError::StorageError(format!("Underlying storage operation failed: {:#}", err))
    }
}

impl From<JoinError> for GraphError {
    fn from(err: JoinError) -> Self {
        GraphError::InternalError(format!("Task failed to join: {:?}", err))
    }
}

/// A validation error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A property name is empty or longer than 255 bytes.
    #[error("property name has invalid length")]
    InvalidPropertyNameLength,
    /// A property name has an empty segment or a segment starting with `$`.
    #[error("property name '{0}' is invalid")]
    InvalidPropertyName(String),
    /// A string could not be parsed as a node identifier.
    #[error("'{0}' is not a valid node id")]
    InvalidNodeId(String),
    /// A single-edge operation was requested without one of its endpoints.
    #[error("single-edge operation requires {0}")]
    MissingEndpoint(&'static str),
    /// A multi-edge search carried an update clause.
    #[error("searches across edges cannot modify properties")]
    UpdateOnSearch,
    /// A property path runs through a value that is not a map.
    #[error("property path {0} conflicts with an existing non-map value")]
    PathConflict(String),
    /// A match expression could not be understood.
    #[error("invalid match expression: {0}")]
    InvalidMatchExpression(String),
}

/// A type alias for a `Result` that returns a `GraphError` on failure.
pub type GraphResult<T> = Result<T, GraphError>;

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;
