//! Error types for lookup operations
//!
//! Configuration problems are fatal and surface when a lookup is built or
//! first used. Data-source failures are propagated to the caller unchanged;
//! nothing in this crate retries or masks them.

use thiserror::Error;

/// Main error type for lookups, data sources and field adapters
#[derive(Error, Debug)]
pub enum LookupError {
    /// Missing or invalid column configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The database rejected or failed the built query
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// A non-database data source rejected the built query
    #[error("Query failed: {0}")]
    Source(String),

    /// An identifier that the lookup's codec cannot encode
    #[error("Invalid identifier '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    /// A stored identifier that the lookup's codec cannot decode
    #[error("Cannot decode identifier from column '{column}': {reason}")]
    StoredId { column: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl LookupError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        LookupError::Configuration(message.into())
    }

    /// Whether this error came from the data source rather than from setup
    pub fn is_query_error(&self) -> bool {
        matches!(self, LookupError::Query(_) | LookupError::Source(_))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, LookupError>;
