use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    /// Legacy store could not be opened. Whole-run fatal.
    #[error("Legacy DB connect failed: {0}")]
    ConnectionError(String),
    #[error("Destination store error: {0}")]
    DestinationError(String),
    #[error("Schema introspection failed: {0}")]
    IntrospectionError(String),
    #[error("Lookup miss: {0}")]
    LookupMiss(String),
    #[error("Asset creation failed for {uri}: {reason}")]
    AssetCreationError { uri: String, reason: String },
    #[error("{0}")]
    PersistError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}
